//! Key/value configuration
//!
//! Plain `key=value` text, one entry per line. Lines starting with `#` and
//! lines without `=` are skipped; a key given twice keeps its last value.

pub mod keys;
pub mod store;

pub use keys::*;
pub use store::{Config, MAX_ENTRIES, MAX_KEY_LEN, MAX_LINE_LEN, MAX_VALUE_LEN};

/// Configuration parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A key exceeds [`MAX_KEY_LEN`]
    KeyTooLong,
    /// A value exceeds [`MAX_VALUE_LEN`]
    ValueTooLong,
    /// More than [`MAX_ENTRIES`] distinct keys
    StoreFull,
    /// A numeric setting is not a number or out of range
    InvalidNumber,
}
