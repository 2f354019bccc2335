//! Settings record
//!
//! The settings text is kept as one record, prefixed with a format byte so
//! that a record written with a different layout is recognised and thrown
//! away instead of being parsed as settings.
//!
//! ```text
//!  0        1                        len
//!  ┌────────┬────────────────────────┐
//!  │ format │ UTF-8 `key=value` text │
//!  └────────┴────────────────────────┘
//! ```

use core::future::Future;
use core::str;

/// Map key the record is stored under
pub const SETTINGS_RECORD_KEY: u16 = 1;

/// Layout of records written by this firmware
pub const RECORD_FORMAT: u8 = 1;

/// Longest settings text that fits in a record
pub const MAX_SETTINGS_LEN: usize = 2047;

/// Longest encoded record
pub const MAX_RECORD_LEN: usize = MAX_SETTINGS_LEN + 1;

/// Errors from a [`SettingsStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The storage driver failed
    Flash,
    /// Nothing has been saved yet
    Empty,
    /// The saved record has an unknown format or is not UTF-8
    Corrupt,
    /// The text does not fit in a record or in the caller's buffer
    TooLarge,
}

/// Persistent home of the settings text
pub trait SettingsStore {
    /// Read the saved text into `buffer` and return it
    fn load<'b>(
        &mut self,
        buffer: &'b mut [u8],
    ) -> impl Future<Output = Result<&'b str, StoreError>>;

    /// Replace the saved text
    fn save(&mut self, text: &str) -> impl Future<Output = Result<(), StoreError>>;

    /// Forget everything saved, including records that no longer decode
    fn wipe(&mut self) -> impl Future<Output = Result<(), StoreError>>;
}

/// Frame `text` into `out`, returning the record length
pub fn encode_record(text: &str, out: &mut [u8]) -> Result<usize, StoreError> {
    if text.len() > MAX_SETTINGS_LEN {
        return Err(StoreError::TooLarge);
    }
    let len = text.len() + 1;
    let Some((format, body)) = out.get_mut(..len).and_then(|r| r.split_first_mut()) else {
        return Err(StoreError::TooLarge);
    };
    *format = RECORD_FORMAT;
    body.copy_from_slice(text.as_bytes());
    Ok(len)
}

/// Settings text held in `record`
pub fn decode_record(record: &[u8]) -> Result<&str, StoreError> {
    match record.split_first() {
        Some((&RECORD_FORMAT, body)) => str::from_utf8(body).map_err(|_| StoreError::Corrupt),
        _ => Err(StoreError::Corrupt),
    }
}
