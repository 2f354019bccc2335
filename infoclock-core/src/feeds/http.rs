//! HTTP GET abstraction
//!
//! Pollers describe what they want with a [`Request`] and hand it to
//! whatever implements [`HttpGet`]. On the board that is the Wi-Fi modem
//! link; in tests it is a canned responder.

use alloc::string::String;
use core::future::Future;

use heapless::Vec;

use super::FeedError;

/// Maximum extra headers per request
pub const MAX_HEADERS: usize = 4;

/// Transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchError {
    /// The link to the network co-processor failed
    Link,
    /// No complete response arrived in time
    Timeout,
    /// The co-processor reported an error
    Rejected,
    /// More than [`MAX_HEADERS`] headers
    TooManyHeaders,
}

/// Extra request header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: &'static str,
    pub value: String,
}

/// A GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: String,
    headers: Vec<Header, MAX_HEADERS>,
}

impl Request {
    /// Request for `url` without extra headers
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, name: &'static str, value: &str) -> Result<Self, FetchError> {
        self.headers
            .push(Header {
                name,
                value: String::from(value),
            })
            .map_err(|_| FetchError::TooManyHeaders)?;
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the URL asks for TLS
    pub fn is_tls(&self) -> bool {
        self.url.starts_with("https://")
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }
}

/// A completed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Something that can perform an HTTP GET
pub trait HttpGet {
    /// Perform `request` and collect the whole body
    fn get(&mut self, request: &Request) -> impl Future<Output = Result<Response, FetchError>>;
}

/// Fetch `request` and return the body of a 200 response
pub async fn fetch_body<H: HttpGet>(http: &mut H, request: &Request) -> Result<String, FeedError> {
    let response = http.get(request).await?;
    if !response.is_ok() {
        return Err(FeedError::Http(response.status));
    }
    Ok(response.body)
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use alloc::vec::Vec as StdVec;

    /// Replays canned responses and records the requests it saw
    pub struct Canned {
        pub replies: StdVec<Result<Response, FetchError>>,
        pub seen: StdVec<Request>,
    }

    impl Canned {
        pub fn new(replies: StdVec<Result<Response, FetchError>>) -> Self {
            Self {
                replies,
                seen: StdVec::new(),
            }
        }

        pub fn ok(body: &str) -> Result<Response, FetchError> {
            Ok(Response {
                status: 200,
                body: String::from(body),
            })
        }
    }

    impl HttpGet for Canned {
        async fn get(&mut self, request: &Request) -> Result<Response, FetchError> {
            self.seen.push(request.clone());
            if self.replies.is_empty() {
                return Err(FetchError::Link);
            }
            self.replies.remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::Canned;
    use super::*;

    #[test]
    fn test_header_limit() {
        let mut request = Request::get("http://example.com/");
        for i in 0..MAX_HEADERS {
            let name = ["A", "B", "C", "D"][i];
            request = request.header(name, "1").unwrap();
        }
        assert_eq!(request.headers().len(), MAX_HEADERS);
        assert_eq!(
            request.header("E", "1").err(),
            Some(FetchError::TooManyHeaders)
        );
    }

    #[test]
    fn test_tls_follows_scheme() {
        assert!(Request::get("https://example.com/").is_tls());
        assert!(!Request::get("http://example.com/").is_tls());
    }

    #[futures_test::test]
    async fn test_fetch_body_maps_status() {
        let mut http = Canned::new(alloc::vec![
            Canned::ok("hello"),
            Ok(Response {
                status: 404,
                body: String::new(),
            }),
            Err(FetchError::Timeout),
        ]);
        let request = Request::get("http://example.com/");

        assert_eq!(fetch_body(&mut http, &request).await.unwrap(), "hello");
        assert_eq!(fetch_body(&mut http, &request).await, Err(FeedError::Http(404)));
        assert_eq!(fetch_body(&mut http, &request).await, Err(FeedError::Transport));
        assert_eq!(http.seen.len(), 3);
    }
}
