//! Remote feeds
//!
//! Parsing and message composition for everything the pollers fetch. The
//! transport itself sits behind [`http::HttpGet`] so this module stays
//! board-agnostic.

pub mod http;
pub mod lhc;
pub mod menu;
pub mod text;
pub mod weather;

use http::FetchError;

/// Feed errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeedError {
    /// Server answered with a status other than 200
    Http(u16),
    /// Request never completed
    Transport,
    /// Body is not valid JSON
    Json,
    /// A value the message needs is absent
    MissingField,
    /// Nothing worth displaying
    Empty,
}

impl From<FetchError> for FeedError {
    fn from(_: FetchError) -> Self {
        FeedError::Transport
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(_: serde_json::Error) -> Self {
        FeedError::Json
    }
}
