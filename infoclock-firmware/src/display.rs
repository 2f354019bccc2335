//! Matrix and broker types shared by the display tasks

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Async, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Delay, Duration};
use embedded_hal_bus::spi::ExclusiveDevice;

use infoclock_core::broker::{AccessBroker, Client};
use infoclock_display::{Animator, DisplayError};
use infoclock_drivers::Max7219;

/// SPI clock for the MAX7219 chain (the part tops out at 10 MHz)
pub const MAX7219_SPI_HZ: u32 = 8_000_000;

/// Clients that may wait for the matrix at once
pub const QUEUE_SLOTS: usize = 3;

/// Clock, marquee, LHC status, weather and menu
pub const CLIENTS: usize = 5;

/// Column step used by every scrolling task
pub const SCROLL_SPEED_MS: u32 = 50;

/// Column step of the outro effects
pub const OUTRO_SPEED_MS: u32 = 20;

/// Wait after the broker turns a request away
pub const BUSY_BACKOFF: Duration = Duration::from_secs(1);

pub type MatrixSpi = ExclusiveDevice<Spi<'static, SPI0, Async>, Output<'static>, Delay>;

/// The shared device: frame buffer, effects and the MAX7219 chain
pub type Matrix = Animator<Max7219<MatrixSpi>, Delay>;

pub type Broker = AccessBroker<CriticalSectionRawMutex, Matrix, QUEUE_SLOTS, CLIENTS>;

pub type DisplayClient = Client<'static, CriticalSectionRawMutex, Matrix, QUEUE_SLOTS, CLIENTS>;

/// How a message leaves the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outro {
    /// Leave the last frame up
    Cut,
    /// Blank column by column from the left
    Wipe,
    /// Push the last frame off the right edge
    SlideRight,
}

/// Queue for the matrix, scroll `text` once and hand the matrix back
///
/// Returns `false` when the broker refused the request.
pub async fn show_message(client: &DisplayClient, who: &str, text: &str, outro: Outro) -> bool {
    let session = match client.session().await {
        Ok(session) => session,
        Err(e) => {
            warn!("{}: failed to get access to display: {:?}", who, e);
            return false;
        }
    };

    {
        let mut matrix = session.resource().await;
        if let Err(e) = scroll(&mut matrix, text, outro).await {
            warn!("{}: display write failed: {:?}", who, e);
        }
    }
    session.release();
    true
}

async fn scroll(matrix: &mut Matrix, text: &str, outro: Outro) -> Result<(), DisplayError> {
    matrix.scroll_message(text, SCROLL_SPEED_MS).await?;
    match outro {
        Outro::Cut => Ok(()),
        Outro::Wipe => matrix.wipe_left_to_right(OUTRO_SPEED_MS).await,
        Outro::SlideRight => matrix.scroll_out_right(OUTRO_SPEED_MS).await,
    }
}
