//! Matrix backend trait
//!
//! Defines the interface between the renderer and the LED driver.

use core::future::Future;

use crate::frame::Frame;

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with the driver chips
    Communication,
}

/// LED matrix backend
///
/// The renderer owns the frame buffer; a backend only pushes a finished
/// frame out to the hardware.
pub trait MatrixBackend {
    /// Number of 8x8 modules in the chain
    fn segments(&self) -> u8;

    /// Show `frame` on the hardware
    fn flush(&mut self, frame: &Frame) -> impl Future<Output = Result<(), DisplayError>>;
}
