//! Text dump of a frame for logs and tests

use alloc::string::String;

use crate::frame::{Frame, ROWS};

/// Render `frame` as eight lines of `#` (on) and space (off)
pub fn render_ascii(frame: &Frame) -> String {
    let mut out = String::with_capacity((frame.width() + 1) * ROWS);
    for y in 0..ROWS {
        for x in 0..frame.width() {
            out.push(if frame.pixel(x, y) { '#' } else { ' ' });
        }
        out.push('\n');
    }
    out
}
