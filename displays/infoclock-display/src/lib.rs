//! LED matrix rendering for Infoclock
//!
//! This crate provides:
//! - [`Frame`]: the 8-row bitmap shown on a chain of 8x8 modules
//! - [`Canvas`]: a wide off-screen strip that text is laid out on
//! - [`Animator`]: centred text, marquee scrolling and wipe effects
//! - [`MatrixBackend`]: the trait a matrix driver implements
//!
//! # Architecture
//!
//! ```text
//!  text ──▶ Canvas ──blit──▶ Frame ──flush──▶ MatrixBackend (MAX7219 chain)
//! ```
//!
//! Both bitmaps implement `embedded_graphics::DrawTarget`, so anything the
//! graphics crate can draw can be shown on the matrix.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

mod log;

pub mod animate;
pub mod ascii;
pub mod backend;
pub mod canvas;
pub mod frame;

pub use animate::Animator;
pub use ascii::render_ascii;
pub use backend::{DisplayError, MatrixBackend};
pub use canvas::{text_width, Canvas, CANVAS_WIDTH, GLYPH_WIDTH};
pub use frame::{Frame, MAX_SEGMENTS, ROWS, SEGMENT_WIDTH};
