//! Command encoding
//!
//! Every command is one text line terminated by CR LF. String parameters
//! are quoted, with `"`, `,` and `\` escaped by a backslash.

use core::fmt::Write;

use heapless::String;

use crate::AtError;

/// Longest encoded command, including the line terminator
pub const MAX_COMMAND_LEN: usize = 320;

/// NTP servers handed to the modem
pub const NTP_SERVERS: [&str; 2] = ["pool.ntp.org", "time.nist.gov"];

/// HTTP transport selected for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transport {
    Tcp,
    Tls,
}

impl Transport {
    /// Transport matching the scheme of `url`
    pub fn for_url(url: &str) -> Self {
        if url.starts_with("https://") {
            Transport::Tls
        } else {
            Transport::Tcp
        }
    }

    fn code(self) -> u8 {
        match self {
            Transport::Tcp => 1,
            Transport::Tls => 2,
        }
    }
}

/// Commands sent to the modem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `AT`, checks that the modem answers
    Attention,
    /// `ATE0`, stop echoing commands back
    EchoOff,
    /// Add a header to the next HTTP request
    HttpHeader { name: &'a str, value: &'a str },
    /// GET `url`; the body arrives as `+HTTPCLIENT` chunks
    HttpGet { url: &'a str, transport: Transport },
    /// Enable SNTP in UTC
    SntpConfig,
    /// Query the SNTP time
    SntpTime,
}

impl Command<'_> {
    /// Encode the command line, terminator included
    pub fn encode(&self) -> Result<String<MAX_COMMAND_LEN>, AtError> {
        let mut out = String::new();
        self.write_to(&mut out).map_err(|_| AtError::BufferFull)?;
        Ok(out)
    }

    fn write_to(&self, out: &mut String<MAX_COMMAND_LEN>) -> core::fmt::Result {
        match *self {
            Command::Attention => out.write_str("AT")?,
            Command::EchoOff => out.write_str("ATE0")?,
            Command::HttpHeader { name, value } => {
                out.write_str("AT+HTTPCHEAD=\"")?;
                write_escaped(out, name)?;
                out.write_str(": ")?;
                write_escaped(out, value)?;
                out.write_char('"')?;
            }
            Command::HttpGet { url, transport } => {
                // opt 2 = GET, content type 0, no separate host/path
                out.write_str("AT+HTTPCLIENT=2,0,\"")?;
                write_escaped(out, url)?;
                write!(out, "\",,,{}", transport.code())?;
            }
            Command::SntpConfig => {
                write!(
                    out,
                    "AT+CIPSNTPCFG=1,0,\"{}\",\"{}\"",
                    NTP_SERVERS[0], NTP_SERVERS[1]
                )?;
            }
            Command::SntpTime => out.write_str("AT+CIPSNTPTIME?")?,
        }
        out.write_str("\r\n")
    }
}

fn write_escaped(out: &mut String<MAX_COMMAND_LEN>, text: &str) -> core::fmt::Result {
    for c in text.chars() {
        if matches!(c, '"' | ',' | '\\') {
            out.write_char('\\')?;
        }
        out.write_char(c)?;
    }
    Ok(())
}
