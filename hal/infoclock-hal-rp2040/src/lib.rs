//! RP2040 backend for the Infoclock HAL
//!
//! - [`FlashSettings`]: settings text in the top sectors of the QSPI flash

#![no_std]

pub mod settings;

pub use infoclock_hal::{SettingsStore, StoreError};
pub use settings::FlashSettings;
