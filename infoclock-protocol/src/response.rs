//! Response parsing
//!
//! [`ResponseParser`] is fed the modem's output one byte at a time. Status
//! lines are collected up to CR LF; after a `+HTTPCLIENT:<len>,` prefix the
//! next `len` bytes are passed through verbatim as body bytes.

use heapless::{String, Vec};

use crate::AtError;

/// Longest status line kept, excluding CR LF
pub const MAX_LINE_LEN: usize = 128;

/// Longest SNTP time string
pub const MAX_TIME_LEN: usize = 40;

const HTTP_PREFIX: &[u8] = b"+HTTPCLIENT:";
const SNTP_PREFIX: &str = "+CIPSNTPTIME:";

/// Something the modem said
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Command completed
    Ok,
    /// Command failed
    Error,
    /// One byte of an HTTP body
    Body(u8),
    /// SNTP time in `asctime` form, e.g. `Thu Aug 04 14:48:05 2016`
    SntpTime(String<MAX_TIME_LEN>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Collecting a status line
    Line,
    /// Reading the decimal length of a body chunk
    Length(usize),
    /// Passing through body bytes
    Body(usize),
    /// Dropping the rest of an overlong line
    Discard,
}

/// Byte-fed parser for modem output
#[derive(Debug, Clone)]
pub struct ResponseParser {
    state: ParseState,
    line: Vec<u8, MAX_LINE_LEN>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    pub const fn new() -> Self {
        Self {
            state: ParseState::Line,
            line: Vec::new(),
        }
    }

    /// Forget any partial line or body
    pub fn reset(&mut self) {
        self.state = ParseState::Line;
        self.line.clear();
    }

    /// Feed one byte
    ///
    /// Returns `Ok(Some(event))` when the byte completes something worth
    /// reporting, `Ok(None)` otherwise. Unrecognised lines are dropped.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Event>, AtError> {
        match self.state {
            ParseState::Line => self.feed_line(byte),
            ParseState::Length(len) => match byte {
                b'0'..=b'9' => {
                    let len = len
                        .checked_mul(10)
                        .and_then(|l| l.checked_add(usize::from(byte - b'0')))
                        .ok_or_else(|| self.fail())?;
                    self.state = ParseState::Length(len);
                    Ok(None)
                }
                b',' => {
                    self.state = if len == 0 {
                        ParseState::Line
                    } else {
                        ParseState::Body(len)
                    };
                    Ok(None)
                }
                _ => Err(self.fail()),
            },
            ParseState::Body(remaining) => {
                self.state = if remaining > 1 {
                    ParseState::Body(remaining - 1)
                } else {
                    ParseState::Line
                };
                Ok(Some(Event::Body(byte)))
            }
            ParseState::Discard => {
                if byte == b'\n' {
                    self.reset();
                }
                Ok(None)
            }
        }
    }

    fn feed_line(&mut self, byte: u8) -> Result<Option<Event>, AtError> {
        if byte == b'\n' {
            let event = classify(&self.line);
            self.line.clear();
            return event;
        }
        if self.line.push(byte).is_err() {
            self.line.clear();
            self.state = ParseState::Discard;
            return Err(AtError::LineTooLong);
        }
        if self.line.as_slice() == HTTP_PREFIX {
            self.line.clear();
            self.state = ParseState::Length(0);
        }
        Ok(None)
    }

    fn fail(&mut self) -> AtError {
        self.reset();
        AtError::Malformed
    }
}

fn classify(raw: &[u8]) -> Result<Option<Event>, AtError> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let Ok(line) = core::str::from_utf8(raw) else {
        return Ok(None);
    };
    match line {
        "OK" | "SEND OK" => Ok(Some(Event::Ok)),
        "ERROR" | "FAIL" => Ok(Some(Event::Error)),
        _ => match line.strip_prefix(SNTP_PREFIX) {
            Some(time) => String::try_from(time.trim())
                .map(|t| Some(Event::SntpTime(t)))
                .map_err(|_| AtError::Malformed),
            None => Ok(None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use std::vec::Vec as StdVec;

    fn feed_all(parser: &mut ResponseParser, bytes: &[u8]) -> StdVec<Result<Event, AtError>> {
        bytes
            .iter()
            .filter_map(|&b| parser.feed(b).transpose())
            .collect()
    }

    fn body_of(events: &[Result<Event, AtError>]) -> StdVec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                Ok(Event::Body(b)) => Some(*b),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_status_lines() {
        let mut parser = ResponseParser::new();
        let events = feed_all(&mut parser, b"AT\r\n\r\nOK\r\nbusy p...\r\nERROR\r\n");
        assert_eq!(events, [Ok(Event::Ok), Ok(Event::Error)]);
    }

    #[test]
    fn test_body_chunks_may_contain_line_breaks() {
        let mut parser = ResponseParser::new();
        let events = feed_all(
            &mut parser,
            b"+HTTPCLIENT:7,OK\r\nab\n+HTTPCLIENT:3,xyz\r\nOK\r\n",
        );
        assert_eq!(body_of(&events), b"OK\r\nab\nxyz");
        assert_eq!(events.last(), Some(&Ok(Event::Ok)));
        assert_eq!(events.iter().filter(|e| **e == Ok(Event::Ok)).count(), 1);
    }

    #[test]
    fn test_sntp_time() {
        let mut parser = ResponseParser::new();
        let events = feed_all(&mut parser, b"+CIPSNTPTIME:Thu Aug 04 14:48:05 2016\r\nOK\r\n");
        assert_eq!(
            events[0],
            Ok(Event::SntpTime(String::try_from("Thu Aug 04 14:48:05 2016").unwrap()))
        );
        assert_eq!(events[1], Ok(Event::Ok));
    }

    #[test]
    fn test_malformed_length_resyncs() {
        let mut parser = ResponseParser::new();
        let events = feed_all(&mut parser, b"+HTTPCLIENT:12x\r\nOK\r\n");
        assert_eq!(events, [Err(AtError::Malformed), Ok(Event::Ok)]);
    }

    #[test]
    fn test_overlong_line_is_dropped() {
        let mut parser = ResponseParser::new();
        let mut input = StdVec::new();
        input.extend(core::iter::repeat(b'z').take(MAX_LINE_LEN + 10));
        input.extend_from_slice(b"\r\nOK\r\n");
        let events = feed_all(&mut parser, &input);
        assert_eq!(events, [Err(AtError::LineTooLong), Ok(Event::Ok)]);
    }

    proptest! {
        #[test]
        fn test_parser_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut parser = ResponseParser::new();
            for b in bytes {
                let _ = parser.feed(b);
            }
        }

        #[test]
        fn test_body_passes_through(body in proptest::collection::vec(any::<u8>(), 1..300)) {
            let mut parser = ResponseParser::new();
            let mut input = StdVec::new();
            input.extend_from_slice(std::format!("+HTTPCLIENT:{},", body.len()).as_bytes());
            input.extend_from_slice(&body);
            input.extend_from_slice(b"\r\nOK\r\n");
            let events = feed_all(&mut parser, &input);
            prop_assert_eq!(body_of(&events), body);
            prop_assert_eq!(events.last(), Some(&Ok(Event::Ok)));
        }
    }
}
