//! Restaurant menu task
//!
//! Fetches the lunch menu whenever the hour or the relevant day changes and
//! scrolls it while the menu window is open.

use alloc::string::String;
use alloc::vec::Vec;

use defmt::*;
use embassy_time::Timer;
use time::Date;

use infoclock_core::config::Config;
use infoclock_core::feeds::http::{fetch_body, HttpGet};
use infoclock_core::feeds::menu::{
    self, novae_key, parse_dishes, FetchSchedule, MenuCache, MenuWindow, Restaurant,
};
use infoclock_core::feeds::FeedError;

use crate::display::{show_message, DisplayClient, Outro, BUSY_BACKOFF};
use crate::tasks::ModemHttp;
use crate::wallclock::WALL_CLOCK;

/// Pause between two showings of the menu
const REDISPLAY_SECS: u64 = 30;

/// Wait for the first SNTP sync
const CLOCK_WAIT_SECS: u64 = 5;

#[embassy_executor::task]
pub async fn menu_task(client: DisplayClient, config: &'static Config) {
    let restaurant = Restaurant::from_config(config);
    let window = MenuWindow::from_config(config);
    let key = novae_key(config);
    info!(
        "Menu task started for R{}, {}h-{}h",
        restaurant.code, window.start_hour, window.end_hour
    );

    let mut http = ModemHttp;
    let mut cache = MenuCache::default();
    let mut schedule = FetchSchedule::default();

    loop {
        let Some(now) = WALL_CLOCK.now() else {
            Timer::after_secs(CLOCK_WAIT_SECS).await;
            continue;
        };

        let date = window.active_date(now);
        if schedule.due(now.hour(), date) {
            match fetch_menu(&mut http, restaurant, date, key).await {
                Ok(dishes) => match cache.store(date, &dishes) {
                    Ok(()) => info!("Menu: {} dishes", dishes.len()),
                    Err(e) => warn!("Menu: nothing to show: {:?}", e),
                },
                Err(e) => warn!("Menu: fetch failed: {:?}", e),
            }
        }

        match cache.message(&window, restaurant, now) {
            Some(text) => {
                if !show_message(&client, "Menu", &text, Outro::Wipe).await {
                    Timer::after(BUSY_BACKOFF).await;
                    continue;
                }
                Timer::after_secs(REDISPLAY_SECS).await;
            }
            None => Timer::after_secs(menu::CHECK_SECS).await,
        }
    }
}

/// Fetch and parse the menu for `date`, retrying transport failures
async fn fetch_menu<H: HttpGet>(
    http: &mut H,
    restaurant: Restaurant,
    date: Date,
    key: &str,
) -> Result<Vec<String>, FeedError> {
    let request = restaurant.request(date, key)?;

    let mut attempt = 1;
    let body = loop {
        match fetch_body(http, &request).await {
            Err(FeedError::Transport) if attempt < menu::FETCH_ATTEMPTS => {
                debug!("Menu: attempt {} failed, retrying", attempt);
                attempt += 1;
                Timer::after_secs(menu::RETRY_SECS).await;
            }
            result => break result?,
        }
    };
    parse_dishes(&body)
}
