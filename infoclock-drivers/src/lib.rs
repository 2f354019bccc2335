//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined in
//! infoclock-display:
//!
//! - MAX7219 LED matrix chain over SPI

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod max7219;

pub use max7219::Max7219;
