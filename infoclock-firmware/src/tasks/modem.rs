//! ESP-AT modem task
//!
//! UART0 is wired to an ESP32 running the ESP-AT firmware, which handles
//! Wi-Fi, TLS and SNTP. This task owns the UART, serves HTTP GET requests
//! from the pollers one at a time, and keeps the wall clock in step.

use alloc::string::String;
use alloc::vec::Vec;

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::BufferedUart;
use embassy_time::{with_timeout, Duration, Instant, Timer};
use embedded_io_async::{Read, Write};

use infoclock_core::feeds::http::{FetchError, HttpGet, Request, Response};
use infoclock_protocol::{is_synced, parse_asctime, Command, Event, ResponseParser, Transport};

use crate::channels::{HTTP_LINK, HTTP_REQUESTS, HTTP_RESPONSES};
use crate::wallclock::WALL_CLOCK;

/// Time allowed for a plain command to answer
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for a whole HTTP exchange
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Wait before probing a silent modem again
const START_RETRY: Duration = Duration::from_secs(5);

/// SNTP poll period until the first real time arrives
const SNTP_RETRY: Duration = Duration::from_secs(10);

/// SNTP poll period once synced
const SNTP_RESYNC: Duration = Duration::from_secs(3600);

/// Bodies longer than this are cut short
const MAX_BODY_LEN: usize = 32 * 1024;

pub type ModemUart = BufferedUart<'static, UART0>;

/// [`HttpGet`] handed to the pollers
///
/// Forwards each request to the modem task and waits for its answer.
pub struct ModemHttp;

impl HttpGet for ModemHttp {
    async fn get(&mut self, request: &Request) -> Result<Response, FetchError> {
        let _link = HTTP_LINK.lock().await;
        HTTP_RESPONSES.reset();
        HTTP_REQUESTS.send(request.clone()).await;
        HTTP_RESPONSES.wait().await
    }
}

struct Modem {
    uart: ModemUart,
    parser: ResponseParser,
}

impl Modem {
    fn new(uart: ModemUart) -> Self {
        Self {
            uart,
            parser: ResponseParser::new(),
        }
    }

    /// Probe the modem, turn echo off and enable SNTP
    async fn start(&mut self) -> Result<(), FetchError> {
        self.exchange(Command::Attention, COMMAND_TIMEOUT, |_| {}).await?;
        self.exchange(Command::EchoOff, COMMAND_TIMEOUT, |_| {}).await?;
        self.exchange(Command::SntpConfig, COMMAND_TIMEOUT, |_| {}).await
    }

    async fn http_get(&mut self, request: &Request) -> Result<Response, FetchError> {
        for header in request.headers() {
            let command = Command::HttpHeader {
                name: header.name,
                value: &header.value,
            };
            self.exchange(command, COMMAND_TIMEOUT, |_| {}).await?;
        }

        let mut body = Vec::new();
        let mut truncated = false;
        let command = Command::HttpGet {
            url: request.url(),
            transport: Transport::for_url(request.url()),
        };
        self.exchange(command, HTTP_TIMEOUT, |event| {
            if let Event::Body(byte) = event {
                if body.len() < MAX_BODY_LEN {
                    body.push(byte);
                } else {
                    truncated = true;
                }
            }
        })
        .await?;

        if truncated {
            warn!("modem: body cut at {} bytes", MAX_BODY_LEN);
        }
        debug!("modem: received {} bytes", body.len());
        Ok(Response {
            // ESP-AT answers ERROR for anything but a 2xx status
            status: 200,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    /// Ask for the SNTP time and update the wall clock
    ///
    /// Returns whether the modem had a real time to give.
    async fn sync_time(&mut self) -> Result<bool, FetchError> {
        let mut reply = None;
        self.exchange(Command::SntpTime, COMMAND_TIMEOUT, |event| {
            if let Event::SntpTime(text) = event {
                reply = Some(text);
            }
        })
        .await?;

        let Some(text) = reply else {
            return Ok(false);
        };
        match parse_asctime(&text) {
            Ok(utc) if is_synced(&utc) => {
                WALL_CLOCK.sync(utc);
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(e) => {
                warn!("modem: unreadable SNTP time {}: {:?}", text.as_str(), e);
                Ok(false)
            }
        }
    }

    /// Send `command` and wait for its final `OK` or `ERROR`
    ///
    /// Everything reported in between is passed to `on_event`.
    async fn exchange(
        &mut self,
        command: Command<'_>,
        timeout: Duration,
        mut on_event: impl FnMut(Event),
    ) -> Result<(), FetchError> {
        let line = command.encode().map_err(|_| FetchError::Rejected)?;
        self.parser.reset();
        self.uart
            .write_all(line.as_bytes())
            .await
            .map_err(|_| FetchError::Link)?;

        match with_timeout(timeout, self.await_status(&mut on_event)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("modem: no answer to {}", line.as_str().trim_end());
                Err(FetchError::Timeout)
            }
        }
    }

    async fn await_status(&mut self, on_event: &mut impl FnMut(Event)) -> Result<(), FetchError> {
        let mut buf = [0u8; 64];
        loop {
            let n = self.uart.read(&mut buf).await.map_err(|_| FetchError::Link)?;
            for &byte in &buf[..n] {
                match self.parser.feed(byte) {
                    Ok(Some(Event::Ok)) => return Ok(()),
                    Ok(Some(Event::Error)) => return Err(FetchError::Rejected),
                    Ok(Some(event)) => on_event(event),
                    Ok(None) => {}
                    Err(e) => warn!("modem: {:?}", e),
                }
            }
        }
    }
}

#[embassy_executor::task]
pub async fn modem_task(uart: ModemUart) {
    info!("Modem task started");

    let mut modem = Modem::new(uart);
    while let Err(e) = modem.start().await {
        warn!("modem: not ready ({:?}), retrying", e);
        Timer::after(START_RETRY).await;
    }
    info!("Modem ready");

    let mut next_sync = Instant::now();
    loop {
        match select(HTTP_REQUESTS.receive(), Timer::at(next_sync)).await {
            Either::First(request) => {
                debug!("modem: GET {}", request.url());
                let result = modem.http_get(&request).await;
                if let Err(e) = &result {
                    warn!("modem: GET failed: {:?}", e);
                }
                HTTP_RESPONSES.signal(result);
            }
            Either::Second(()) => {
                let synced = match modem.sync_time().await {
                    Ok(synced) => synced,
                    Err(e) => {
                        warn!("modem: SNTP query failed: {:?}", e);
                        false
                    }
                };
                next_sync = Instant::now() + if synced { SNTP_RESYNC } else { SNTP_RETRY };
                if synced {
                    info!("Wall clock synced");
                }
            }
        }
    }
}
