//! Weather task
//!
//! Fetches current conditions and the forecast from OpenWeatherMap every
//! quarter hour and scrolls the report every twenty seconds.

use alloc::string::String;

use defmt::*;
use embassy_time::{Duration, Instant, Timer};

use infoclock_core::config::{Config, OW_API_KEY, OW_CITY_ID};
use infoclock_core::feeds::http::{fetch_body, HttpGet};
use infoclock_core::feeds::weather::{self, current_request, forecast_request, parse_current, parse_forecast, report};
use infoclock_core::feeds::FeedError;

use crate::display::{show_message, DisplayClient, Outro};
use crate::tasks::ModemHttp;

#[embassy_executor::task]
pub async fn weather_task(client: DisplayClient, config: &'static Config) {
    let city = config.get_or(OW_CITY_ID, "");
    let api_key = config.get_or(OW_API_KEY, "");
    if city.is_empty() || api_key.is_empty() {
        warn!("Weather: no city or API key configured, not polling");
        return;
    }
    info!("Weather task started for city {}", city);

    let mut http = ModemHttp;
    let mut message: Option<String> = None;
    let mut last_update: Option<Instant> = None;
    let refresh = Duration::from_secs(weather::REFRESH_SECS);
    let retry = Duration::from_secs(weather::RETRY_SECS);

    loop {
        if last_update.map_or(true, |at| at.elapsed() > refresh) {
            match fetch_report(&mut http, city, api_key).await {
                Ok(text) => {
                    info!("Weather: {}", text.as_str());
                    message = Some(text);
                    last_update = Some(Instant::now());
                }
                Err(e) => {
                    warn!("Weather: fetch failed: {:?}", e);
                    Timer::after(retry).await;
                }
            }
        }

        let Some(text) = message.as_deref() else {
            Timer::after(retry).await;
            continue;
        };
        if !show_message(&client, "Weather", text, Outro::SlideRight).await {
            Timer::after(retry).await;
            continue;
        }
        Timer::after_secs(weather::REDISPLAY_SECS).await;
    }
}

async fn fetch_report<H: HttpGet>(http: &mut H, city: &str, api_key: &str) -> Result<String, FeedError> {
    let current = parse_current(&fetch_body(http, &current_request(city, api_key)).await?)?;
    let forecast = parse_forecast(&fetch_body(http, &forecast_request(city, api_key)).await?)?;
    Ok(report(current, &forecast))
}
