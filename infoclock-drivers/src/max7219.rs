//! MAX7219 LED matrix driver (SPI)
//!
//! Each MAX7219 drives one 8x8 module; modules are daisy-chained so that
//! data shifted into the first chip falls through to the next one.
//!
//! # SPI Protocol
//!
//! Every chip takes a 16-bit word per CS pulse: register address, then
//! data. For a chain of N chips a transfer carries N words; the first
//! word sent ends up in the chip furthest from the MCU.
//!
//! Row registers `DIGIT0..DIGIT7` hold one matrix row each, with the
//! leftmost pixel in the most significant bit.

use embedded_hal_async::spi::SpiDevice;
use infoclock_display::{DisplayError, Frame, MatrixBackend, MAX_SEGMENTS, ROWS};

/// MAX7219 register addresses
pub mod reg {
    /// No operation, used to pad chained writes
    pub const NOOP: u8 = 0x00;
    /// First row register; rows are `DIGIT0 + row`
    pub const DIGIT0: u8 = 0x01;
    /// BCD decode per digit
    pub const DECODE_MODE: u8 = 0x09;
    /// LED brightness (0-15)
    pub const INTENSITY: u8 = 0x0A;
    /// Number of digits scanned, minus one
    pub const SCAN_LIMIT: u8 = 0x0B;
    /// 0 = shutdown, 1 = normal operation
    pub const SHUTDOWN: u8 = 0x0C;
    /// 1 = all LEDs on
    pub const DISPLAY_TEST: u8 = 0x0F;
}

/// Brightness used after init
pub const DEFAULT_INTENSITY: u8 = 8;

/// Highest brightness level
pub const MAX_INTENSITY: u8 = 15;

/// Driver for a chain of MAX7219 modules
pub struct Max7219<SPI> {
    spi: SPI,
    segments: u8,
    buffer: [u8; 2 * MAX_SEGMENTS],
}

impl<SPI: SpiDevice> Max7219<SPI> {
    /// Create a driver for `segments` chained modules
    pub fn new(spi: SPI, segments: u8) -> Self {
        Self {
            spi,
            segments: segments.clamp(1, MAX_SEGMENTS as u8),
            buffer: [0; 2 * MAX_SEGMENTS],
        }
    }

    /// Bring every chip out of shutdown with a blank matrix
    pub async fn init(&mut self) -> Result<(), DisplayError> {
        self.broadcast(reg::SCAN_LIMIT, 7).await?;
        self.broadcast(reg::DECODE_MODE, 0).await?;
        self.broadcast(reg::INTENSITY, DEFAULT_INTENSITY).await?;
        self.broadcast(reg::SHUTDOWN, 1).await?;
        self.broadcast(reg::DISPLAY_TEST, 0).await?;
        for row in 0..ROWS as u8 {
            self.broadcast(reg::DIGIT0 + row, 0).await?;
        }
        Ok(())
    }

    /// Set brightness on every module (clamped to 0-15)
    pub async fn set_intensity(&mut self, level: u8) -> Result<(), DisplayError> {
        self.broadcast(reg::INTENSITY, level.min(MAX_INTENSITY)).await
    }

    /// Switch the LEDs on or off without losing the row contents
    pub async fn set_enabled(&mut self, enabled: bool) -> Result<(), DisplayError> {
        self.broadcast(reg::SHUTDOWN, u8::from(enabled)).await
    }

    /// Release the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Write the same register on every chip
    async fn broadcast(&mut self, register: u8, value: u8) -> Result<(), DisplayError> {
        let len = 2 * self.segments as usize;
        for word in self.buffer[..len].chunks_exact_mut(2) {
            word[0] = register;
            word[1] = value;
        }
        self.send(len).await
    }

    async fn send(&mut self, len: usize) -> Result<(), DisplayError> {
        self.spi
            .write(&self.buffer[..len])
            .await
            .map_err(|_| DisplayError::Communication)
    }
}

impl<SPI: SpiDevice> MatrixBackend for Max7219<SPI> {
    fn segments(&self) -> u8 {
        self.segments
    }

    async fn flush(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let chain = self.segments as usize;
        let len = 2 * chain;
        for row in 0..ROWS {
            // Last module first, so it has shifted furthest when CS rises
            for (slot, segment) in (0..chain).rev().enumerate() {
                self.buffer[2 * slot] = reg::DIGIT0 + row as u8;
                self.buffer[2 * slot + 1] = if segment < frame.segments() as usize {
                    frame.row_byte(segment, row)
                } else {
                    0
                };
            }
            self.send(len).await?;
        }
        Ok(())
    }
}
