//! Configuration store
//!
//! Fixed-capacity map from key to value. Both are stored as text; typed
//! getters parse on access and fall back to a default when a value is
//! missing or out of range.

use core::fmt;

use heapless::{FnvIndexMap, String};

use super::keys::*;
use super::ConfigError;
use crate::log::{debug, warn};

/// Longest accepted line, excluding the newline
pub const MAX_LINE_LEN: usize = 127;

/// Longest accepted key
pub const MAX_KEY_LEN: usize = 24;

/// Longest accepted value
pub const MAX_VALUE_LEN: usize = 96;

/// Maximum number of distinct keys (power of two)
pub const MAX_ENTRIES: usize = 16;

type Key = String<MAX_KEY_LEN>;
type Value = String<MAX_VALUE_LEN>;

/// Key/value settings
#[derive(Debug, Clone, Default)]
pub struct Config {
    entries: FnvIndexMap<Key, Value, MAX_ENTRIES>,
}

impl Config {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` text
    ///
    /// Keys and values are trimmed of surrounding whitespace. Comment
    /// lines, blank lines, lines without `=` and lines longer than
    /// [`MAX_LINE_LEN`] are skipped; the entries around them still load.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        for (number, line) in text.lines().enumerate() {
            if line.len() > MAX_LINE_LEN {
                warn!("config: skipping line {}, {} bytes long", number + 1, line.len());
                continue;
            }
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            config.set(key, value.trim())?;
            debug!("config: loaded key {}", key);
        }
        Ok(config)
    }

    /// Insert or replace a value
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let key = Key::try_from(key).map_err(|_| ConfigError::KeyTooLong)?;
        let value = Value::try_from(value).map_err(|_| ConfigError::ValueTooLong)?;
        self.entries
            .insert(key, value)
            .map_err(|_| ConfigError::StoreFull)?;
        Ok(())
    }

    /// Raw value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = Key::try_from(key).ok()?;
        self.entries.get(&key).map(|v| v.as_str())
    }

    /// Raw value for `key`, or `default` when unset
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Check whether `key` is set
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`, returning whether it was set
    pub fn remove(&mut self, key: &str) -> bool {
        match Key::try_from(key) {
            Ok(key) => self.entries.remove(&key).is_some(),
            Err(_) => false,
        }
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse `key` as a decimal integer
    ///
    /// `Ok(None)` when unset, [`ConfigError::InvalidNumber`] when set to
    /// something that is not a number.
    pub fn number(&self, key: &str) -> Result<Option<i32>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i32>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber),
        }
    }

    /// Integer value of `key`, or `default` when unset or not a number
    pub fn i32_or(&self, key: &str, default: i32) -> i32 {
        self.number(key).ok().flatten().unwrap_or(default)
    }

    /// Hour of day (0..=23) stored under `key`, or `default`
    pub fn hour_or(&self, key: &str, default: u8) -> u8 {
        match self.number(key) {
            Ok(Some(hour @ 0..=23)) => hour as u8,
            _ => default,
        }
    }

    /// Flag stored under `key`: `1` is on, any other number is off
    pub fn flag_or(&self, key: &str, default: bool) -> bool {
        match self.number(key) {
            Ok(Some(n)) => n == 1,
            _ => default,
        }
    }

    /// Number of matrix modules, clamped to the supported chain length
    pub fn display_segments(&self) -> u8 {
        match self.number(DISPLAY_SEGMENTS) {
            Ok(Some(n)) if (1..=MAX_DISPLAY_SEGMENTS as i32).contains(&n) => n as u8,
            _ => DEFAULT_DISPLAY_SEGMENTS,
        }
    }

    /// Local time offset from UTC in hours
    pub fn utc_offset_hours(&self) -> i8 {
        match self.number(UTC_OFFSET_HOURS) {
            Ok(Some(n)) if (-12..=14).contains(&n) => n as i8,
            _ => 0,
        }
    }

    /// Text for the marquee
    pub fn marquee_text(&self) -> &str {
        match self.get(MARQUEE_TEXT) {
            Some(text) if !text.is_empty() => text,
            _ => DEFAULT_MARQUEE_TEXT,
        }
    }

    /// Check that every numeric setting that is present is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(self.number(MENU_START_HOUR)?, 0, 23)?;
        check_range(self.number(MENU_END_HOUR)?, 0, 23)?;
        check_range(self.number(MENU_SHOW_TOMORROW)?, 0, 1)?;
        check_range(self.number(RESTAURANT)?, i32::MIN, i32::MAX)?;
        check_range(self.number(DISPLAY_SEGMENTS)?, 1, MAX_DISPLAY_SEGMENTS as i32)?;
        check_range(self.number(UTC_OFFSET_HOURS)?, -12, 14)?;
        Ok(())
    }

    /// Write the store back out as `key=value` lines
    pub fn write_text<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for (key, value) in self.iter() {
            writeln!(out, "{}={}", key, value)?;
        }
        Ok(())
    }
}

fn check_range(value: Option<i32>, min: i32, max: i32) -> Result<(), ConfigError> {
    match value {
        Some(n) if n < min || n > max => Err(ConfigError::InvalidNumber),
        _ => Ok(()),
    }
}
