//! Off-screen text canvas
//!
//! Text is laid out on a strip wider than any matrix chain, then windows of
//! it are copied into the [`Frame`]. The strip only holds a slice of a long
//! message at a time: positions are given in text pixels, and
//! [`print_from`](Canvas::print_from) moves the slice along as the message
//! scrolls, so there is no limit on message length.

use core::convert::Infallible;

use embedded_graphics::mono_font::ascii::FONT_5X8;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::frame::{Frame, ROWS};

/// Canvas width in pixels
pub const CANVAS_WIDTH: usize = 256;

/// Advance of one glyph in the matrix font
pub const GLYPH_WIDTH: usize = 5;

const GLYPHS_PER_SLICE: usize = CANVAS_WIDTH / GLYPH_WIDTH;

/// Pixel width of single-line `text` in the matrix font
///
/// Characters missing from the font are drawn as a replacement glyph of the
/// same width.
pub fn text_width(text: &str) -> usize {
    text.chars().count() * GLYPH_WIDTH
}

/// One-bit strip holding a slice of laid-out text
pub struct Canvas {
    columns: [u8; CANVAS_WIDTH],
    /// Text column shown at canvas column 0
    origin: usize,
    /// Laid-out columns from `origin`
    laid: usize,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub const fn new() -> Self {
        Self {
            columns: [0; CANVAS_WIDTH],
            origin: 0,
            laid: 0,
        }
    }

    /// Lay out `text` from its first glyph, replacing the previous content
    ///
    /// Returns the width of the whole text in pixels, including any part
    /// that did not fit on the strip.
    pub fn print(&mut self, text: &str) -> usize {
        self.print_from(text, 0);
        text_width(text)
    }

    /// Lay out the slice of `text` that starts at or just before text column `x`
    pub fn print_from(&mut self, text: &str, x: usize) {
        let first = x / GLYPH_WIDTH;
        let start = byte_offset(text, first);
        let rest = &text[start..];
        let slice = &rest[..byte_offset(rest, GLYPHS_PER_SLICE)];

        self.columns.fill(0);
        self.origin = first * GLYPH_WIDTH;
        let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
        let end = Text::with_baseline(slice, Point::zero(), style, Baseline::Top)
            .draw(self)
            .unwrap_or_else(|never| match never {});
        self.laid = (end.x.max(0) as usize).min(CANVAS_WIDTH);
    }

    /// Check whether text columns `x..x + len` are on the strip
    pub fn covers(&self, x: usize, len: usize) -> bool {
        x >= self.origin && x + len <= self.origin + self.laid
    }

    /// Copy text columns starting at `x` into `frame` starting at `frame_offset`
    ///
    /// Frame columns before `frame_offset` are left alone; columns past the
    /// laid-out slice come out blank.
    pub fn blit(&self, x: usize, frame: &mut Frame, frame_offset: usize) {
        for i in 0..frame.width().saturating_sub(frame_offset) {
            frame.set_column(frame_offset + i, self.column(x + i));
        }
    }

    /// Bits of text column `x`, blank when it is not on the strip
    pub fn column(&self, x: usize) -> u8 {
        x.checked_sub(self.origin)
            .filter(|&c| c < self.laid)
            .map_or(0, |c| self.columns[c])
    }
}

/// Byte index of the `n`th character, or the end of `text`
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(CANVAS_WIDTH as u32, ROWS as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
                continue;
            };
            if x >= CANVAS_WIDTH || y >= ROWS {
                continue;
            }
            if color.is_on() {
                self.columns[x] |= 1 << y;
            } else {
                self.columns[x] &= !(1 << y);
            }
        }
        Ok(())
    }
}
