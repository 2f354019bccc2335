//! Settings loading
//!
//! Settings live in flash as `key=value` text. When flash holds nothing
//! usable the text embedded at build time is used and written back.

pub mod loader;

pub use loader::{embedded_config, ConfigLoadError, ConfigPersistence};
