//! Heartbeat LED

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

/// Time the LED spends in each state
const HALF_PERIOD: Duration = Duration::from_secs(1);

#[embassy_executor::task]
pub async fn blink_task(mut led: Output<'static>) {
    info!("Blink task started");

    let mut ticker = Ticker::every(HALF_PERIOD);
    loop {
        led.toggle();
        ticker.next().await;
    }
}
