//! Exclusive access to a shared device
//!
//! Built bottom-up from two primitives:
//!
//! - [`RequestQueue`]: bounded FIFO of waiting client ids
//! - [`Notification`]: one-shot wake-up, one per client
//!
//! [`AccessBroker`] combines them with an arbitration loop that grants the
//! device to one client at a time, in arrival order.

pub mod access;
pub mod client;
pub mod error;
pub mod notify;
pub mod queue;

pub use access::{AccessBroker, Holder, TaskId};
pub use client::{Client, Session};
pub use error::BrokerError;
pub use notify::Notification;
pub use queue::RequestQueue;
