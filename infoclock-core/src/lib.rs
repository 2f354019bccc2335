//! Board-agnostic core logic for the Infoclock firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Exclusive-access broker sharing the LED matrix between tasks
//! - Key/value configuration store
//! - Feed parsing and message composition (LHC status, weather, menus)
//! - HTTP fetch abstraction used by the feed pollers

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

mod log;

pub mod broker;
pub mod config;
pub mod feeds;
