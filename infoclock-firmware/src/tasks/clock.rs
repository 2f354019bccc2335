//! Clock display task
//!
//! Shows the time three times, one second apart, then the date for two
//! seconds, and gives the matrix back.

use alloc::format;
use alloc::string::String;

use defmt::*;
use embassy_time::Timer;
use time::PrimitiveDateTime;

use infoclock_display::DisplayError;

use crate::display::{DisplayClient, Matrix, BUSY_BACKOFF};
use crate::wallclock::WALL_CLOCK;

/// Times the clock face is redrawn per turn
const TIME_REPEATS: u8 = 3;

const TIME_HOLD_MS: u32 = 1000;
const DATE_HOLD_MS: u64 = 2000;

/// Column where the date starts
const DATE_X: usize = 2;

/// Pause between turns
const IDLE_MS: u64 = 2000;

#[embassy_executor::task]
pub async fn clock_task(client: DisplayClient) {
    info!("Clock task started");

    loop {
        let session = match client.session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Clock: failed to get access to display: {:?}", e);
                Timer::after(BUSY_BACKOFF).await;
                continue;
            }
        };

        {
            let mut matrix = session.resource().await;
            if let Err(e) = show_clock(&mut matrix).await {
                warn!("Clock: display write failed: {:?}", e);
            }
        }
        session.release();

        Timer::after_millis(IDLE_MS).await;
    }
}

async fn show_clock(matrix: &mut Matrix) -> Result<(), DisplayError> {
    for _ in 0..TIME_REPEATS {
        let text = WALL_CLOCK.now().map_or_else(|| String::from("--:--:--"), time_text);
        trace!("Clock: {}", text.as_str());
        matrix.show_centered(&text, TIME_HOLD_MS).await?;
    }

    if let Some(now) = WALL_CLOCK.now() {
        matrix.show_at(DATE_X, &date_text(now)).await?;
        Timer::after_millis(DATE_HOLD_MS).await;
    }
    Ok(())
}

fn time_text(now: PrimitiveDateTime) -> String {
    format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second())
}

fn date_text(now: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        now.year(),
        u8::from(now.month()),
        now.day()
    )
}
