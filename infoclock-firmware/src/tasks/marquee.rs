//! Marquee task
//!
//! Scrolls the configured banner every second and a half.

use defmt::*;
use embassy_time::Timer;

use infoclock_core::config::Config;

use crate::display::{show_message, DisplayClient, Outro};

const BEFORE_MS: u64 = 1000;
const AFTER_MS: u64 = 500;

#[embassy_executor::task]
pub async fn marquee_task(client: DisplayClient, config: &'static Config) {
    let text = config.marquee_text();
    info!("Marquee task started: {}", text);

    loop {
        Timer::after_millis(BEFORE_MS).await;
        if !show_message(&client, "Marquee", text, Outro::Cut).await {
            continue;
        }
        Timer::after_millis(AFTER_MS).await;
    }
}
