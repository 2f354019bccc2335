//! ESP-AT link protocol
//!
//! This crate covers the UART conversation between the RP2040 and an
//! ESP32 running the stock ESP-AT firmware, which does the Wi-Fi, TLS and
//! HTTP work on our behalf.
//!
//! # Conversation
//!
//! ```text
//! RP2040                              ESP-AT
//!   │ AT+HTTPCHEAD="Accept: ..."\r\n    │
//!   │ ────────────────────────────────▶ │
//!   │                          OK\r\n   │
//!   │ ◀──────────────────────────────── │
//!   │ AT+HTTPCLIENT=2,0,"url",,,2\r\n   │
//!   │ ────────────────────────────────▶ │
//!   │   +HTTPCLIENT:<len>,<data>  (×n)  │
//!   │   OK\r\n | ERROR\r\n              │
//!   │ ◀──────────────────────────────── │
//! ```
//!
//! Commands are plain text lines; responses are parsed byte by byte so the
//! body chunks, which may contain line breaks, are never mistaken for
//! status lines.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod response;
pub mod sntp;

pub use command::{Command, Transport, MAX_COMMAND_LEN};
pub use response::{Event, ResponseParser, MAX_LINE_LEN};
pub use sntp::{is_synced, parse_asctime};

/// Errors from encoding commands or parsing responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AtError {
    /// A response line exceeds [`MAX_LINE_LEN`]
    LineTooLong,
    /// A response line does not have the expected shape
    Malformed,
    /// A command does not fit in [`MAX_COMMAND_LEN`]
    BufferFull,
}
