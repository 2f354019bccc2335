//! Settings text in on-board flash
//!
//! The top 64 KiB of the 2 MiB flash hold a sequential-storage map with a
//! single entry, the framed settings record. Each save appends a new copy
//! and sequential-storage reclaims pages once the partition fills up.
//! `memory.x` stops the program image short of this range.

use core::ops::Range;

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embedded_storage_async::nor_flash::NorFlash;
use infoclock_hal::settings::{decode_record, encode_record, MAX_RECORD_LEN, SETTINGS_RECORD_KEY};
use infoclock_hal::{SettingsStore, StoreError};
use sequential_storage::cache::NoCache;
use sequential_storage::map;

/// Flash fitted to the board
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Sectors reserved for settings
pub const SETTINGS_PARTITION: Range<u32> = (FLASH_SIZE as u32 - 64 * 1024)..FLASH_SIZE as u32;

// Record plus the map's key and item header
const SCRATCH_LEN: usize = MAX_RECORD_LEN + 32;

/// Settings store backed by the RP2040 QSPI flash
pub struct FlashSettings<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    scratch: [u8; SCRATCH_LEN],
    record: [u8; MAX_RECORD_LEN],
}

impl<'d> FlashSettings<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            scratch: [0; SCRATCH_LEN],
            record: [0; MAX_RECORD_LEN],
        }
    }
}

impl SettingsStore for FlashSettings<'_> {
    async fn load<'b>(&mut self, buffer: &'b mut [u8]) -> Result<&'b str, StoreError> {
        let fetched = map::fetch_item::<u16, &[u8], _>(
            &mut self.flash,
            SETTINGS_PARTITION,
            &mut NoCache::new(),
            &mut self.scratch,
            &SETTINGS_RECORD_KEY,
        )
        .await
        .map_err(|_| StoreError::Flash)?;

        let Some(record) = fetched else {
            return Err(StoreError::Empty);
        };
        let Some(copy) = buffer.get_mut(..record.len()) else {
            return Err(StoreError::TooLarge);
        };
        copy.copy_from_slice(record);
        decode_record(copy)
    }

    async fn save(&mut self, text: &str) -> Result<(), StoreError> {
        let len = encode_record(text, &mut self.record)?;
        map::store_item(
            &mut self.flash,
            SETTINGS_PARTITION,
            &mut NoCache::new(),
            &mut self.scratch,
            &SETTINGS_RECORD_KEY,
            &&self.record[..len],
        )
        .await
        .map_err(|_| StoreError::Flash)
    }

    async fn wipe(&mut self) -> Result<(), StoreError> {
        self.flash
            .erase(SETTINGS_PARTITION.start, SETTINGS_PARTITION.end)
            .await
            .map_err(|_| StoreError::Flash)
    }
}
