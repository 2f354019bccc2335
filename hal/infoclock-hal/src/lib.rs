//! Infoclock Hardware Abstraction Layer
//!
//! The only thing the firmware keeps across power cycles is its settings
//! text. This crate fixes how that text is framed on storage and the trait a
//! board backend implements to keep it.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  infoclock-firmware (ConfigPersistence) │
//! └─────────────────────────────────────────┘
//!                     │ SettingsStore
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  infoclock-hal-rp2040 (FlashSettings)   │
//! └─────────────────────────────────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod settings;

pub use settings::{SettingsStore, StoreError};
