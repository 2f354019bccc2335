//! Settings persistence
//!
//! Loads the settings text from flash storage. Falls back to the embedded
//! defaults if flash is empty or holds something unreadable.

use defmt::*;
use heapless::String;

use infoclock_core::config::{Config, ConfigError};
use infoclock_hal::settings::{MAX_RECORD_LEN, MAX_SETTINGS_LEN};
use infoclock_hal_rp2040::{FlashSettings, SettingsStore, StoreError};

use crate::EMBEDDED_CONFIG;

/// Settings loading errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigLoadError {
    /// Settings store failed or holds nothing usable
    Store(StoreError),
    /// Stored text does not parse or is out of range
    Parse(ConfigError),
}

impl From<StoreError> for ConfigLoadError {
    fn from(e: StoreError) -> Self {
        ConfigLoadError::Store(e)
    }
}

impl From<ConfigError> for ConfigLoadError {
    fn from(e: ConfigError) -> Self {
        ConfigLoadError::Parse(e)
    }
}

/// Settings persistence manager
pub struct ConfigPersistence<'d> {
    store: FlashSettings<'d>,
}

impl<'d> ConfigPersistence<'d> {
    pub fn new(store: FlashSettings<'d>) -> Self {
        Self { store }
    }

    /// Load settings from flash
    pub async fn load(&mut self) -> Result<Config, ConfigLoadError> {
        info!("Loading settings from flash...");

        let mut buffer = [0u8; MAX_RECORD_LEN];
        let text = self.store.load(&mut buffer).await?;
        debug!("Read {} bytes of settings from flash", text.len());

        let config = Config::parse(text)?;
        config.validate()?;

        log_config_summary(&config);
        Ok(config)
    }

    /// Write `config` to flash, replacing whatever was stored
    pub async fn store(&mut self, config: &Config) -> Result<(), ConfigLoadError> {
        let mut text: String<MAX_SETTINGS_LEN> = String::new();
        config
            .write_text(&mut text)
            .map_err(|_| ConfigLoadError::Store(StoreError::TooLarge))?;
        self.store.save(&text).await?;
        info!("Stored {} settings in flash", config.len());
        Ok(())
    }

    /// Wipe the settings partition
    pub async fn reset(&mut self) -> Result<(), ConfigLoadError> {
        warn!("Erasing settings partition");
        self.store.wipe().await?;
        Ok(())
    }
}

/// Settings compiled into the firmware
///
/// The build script has already checked `infoclock.conf`, so this only
/// falls back to an empty store if the two ever disagree.
pub fn embedded_config() -> Config {
    match Config::parse(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse embedded settings: {:?}", e);
            Config::new()
        }
    }
}

fn log_config_summary(config: &Config) {
    info!("Settings loaded successfully");
    for (key, _) in config.iter() {
        debug!("  {}", key);
    }
}
