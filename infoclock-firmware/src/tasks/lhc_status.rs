//! LHC status task
//!
//! Polls the machine status feed and scrolls the operating mode, then the
//! operator's page 1 comment.

use alloc::string::String;

use defmt::*;
use embassy_time::{Duration, Instant, Timer};

use infoclock_core::feeds::http::{fetch_body, Request};
use infoclock_core::feeds::lhc::{self, LhcStatus};

use crate::display::{show_message, DisplayClient, Outro, BUSY_BACKOFF};
use crate::tasks::ModemHttp;

/// Pause after each message
const BETWEEN_MS: u64 = 5000;

#[embassy_executor::task]
pub async fn lhc_status_task(client: DisplayClient) {
    info!("LHC status task started");

    let mut http = ModemHttp;
    let mut status = LhcStatus::default();
    let mut mode_message = String::new();
    let mut last_update: Option<Instant> = None;
    let refresh = Duration::from_secs(lhc::REFRESH_SECS);

    loop {
        if last_update.map_or(true, |at| at.elapsed() > refresh) {
            match fetch_body(&mut http, &Request::get(lhc::STATUS_URL)).await {
                Ok(body) => {
                    if status.update(&body) {
                        mode_message = status.mode_message();
                        info!("LHC status: {}", mode_message.as_str());
                        last_update = Some(Instant::now());
                    }
                }
                Err(e) => {
                    warn!("LHC status: fetch failed: {:?}", e);
                    Timer::after_secs(lhc::RETRY_SECS).await;
                    continue;
                }
            }
        }

        if !mode_message.is_empty()
            && !show_message(&client, "LHC status", &mode_message, Outro::Cut).await
        {
            Timer::after(BUSY_BACKOFF).await;
            continue;
        }
        Timer::after_millis(BETWEEN_MS).await;

        if let Some(page1) = status.page1_message() {
            if !show_message(&client, "LHC status", page1, Outro::Wipe).await {
                Timer::after(BUSY_BACKOFF).await;
                continue;
            }
        }
        Timer::after_millis(BETWEEN_MS).await;
    }
}
