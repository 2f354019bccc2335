//! Inter-task communication channels
//!
//! The pollers reach the network through the modem task. Requests go in
//! through [`HTTP_REQUESTS`], the outcome comes back on
//! [`HTTP_RESPONSES`], and [`HTTP_LINK`] keeps a single request in flight.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;

use infoclock_core::feeds::http::{FetchError, Request, Response};

/// Pending HTTP GET for the modem task
pub static HTTP_REQUESTS: Channel<CriticalSectionRawMutex, Request, 1> = Channel::new();

/// Result of the request in flight
pub static HTTP_RESPONSES: Signal<CriticalSectionRawMutex, Result<Response, FetchError>> =
    Signal::new();

/// Held by the poller whose request is in flight
pub static HTTP_LINK: Mutex<CriticalSectionRawMutex, ()> = Mutex::new(());
