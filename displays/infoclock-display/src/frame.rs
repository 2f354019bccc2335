//! Matrix frame buffer
//!
//! Eight rows by `segments * 8` columns. Pixels are stored column-major,
//! one byte per column with bit `y` holding row `y` (row 0 at the top).

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

/// Rows on every matrix module
pub const ROWS: usize = 8;

/// Columns per 8x8 module
pub const SEGMENT_WIDTH: usize = 8;

/// Longest supported module chain
pub const MAX_SEGMENTS: usize = 16;

const MAX_COLUMNS: usize = MAX_SEGMENTS * SEGMENT_WIDTH;

/// Bitmap for a chain of 8x8 modules
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    columns: [u8; MAX_COLUMNS],
    segments: u8,
}

impl Frame {
    /// Blank frame for `segments` modules, clamped to `1..=MAX_SEGMENTS`
    pub fn new(segments: u8) -> Self {
        Self {
            columns: [0; MAX_COLUMNS],
            segments: segments.clamp(1, MAX_SEGMENTS as u8),
        }
    }

    /// Number of modules
    pub fn segments(&self) -> u8 {
        self.segments
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.segments as usize * SEGMENT_WIDTH
    }

    /// Turn every pixel off
    pub fn clear(&mut self) {
        self.columns.fill(0);
    }

    /// Set one pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        if x >= self.width() || y >= ROWS {
            return;
        }
        if on {
            self.columns[x] |= 1 << y;
        } else {
            self.columns[x] &= !(1 << y);
        }
    }

    /// Read one pixel; out-of-range coordinates read as off
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < self.width() && y < ROWS && self.columns[x] & (1 << y) != 0
    }

    /// Replace a whole column
    pub fn set_column(&mut self, x: usize, bits: u8) {
        if x < self.width() {
            self.columns[x] = bits;
        }
    }

    /// Bits of one column
    pub fn column(&self, x: usize) -> u8 {
        if x < self.width() {
            self.columns[x]
        } else {
            0
        }
    }

    /// Shift everything one column to the right; the leftmost column blanks
    pub fn scroll_right(&mut self) {
        let width = self.width();
        self.columns.copy_within(0..width - 1, 1);
        self.columns[0] = 0;
    }

    /// Row `row` of module `segment`, leftmost pixel in the most significant bit
    pub fn row_byte(&self, segment: usize, row: usize) -> u8 {
        let start = segment * SEGMENT_WIDTH;
        (0..SEGMENT_WIDTH).fold(0u8, |byte, i| {
            byte | (u8::from(self.pixel(start + i, row)) << (7 - i))
        })
    }

    /// Check whether every pixel is off
    pub fn is_blank(&self) -> bool {
        self.columns[..self.width()].iter().all(|&c| c == 0)
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Frame")
            .field("segments", &self.segments)
            .field("columns", &&self.columns[..self.width()])
            .finish()
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width() as u32, ROWS as u32)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as usize, point.y as usize, color.is_on());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_pixels_and_bounds() {
        let mut frame = Frame::new(2);
        assert_eq!(frame.width(), 16);
        frame.set_pixel(3, 7, true);
        frame.set_pixel(16, 0, true);
        frame.set_pixel(0, 8, true);
        assert!(frame.pixel(3, 7));
        assert!(!frame.pixel(16, 0));
        assert_eq!(frame.column(3), 0x80);
        frame.set_pixel(3, 7, false);
        assert!(frame.is_blank());
    }

    #[test]
    fn test_segment_clamp() {
        assert_eq!(Frame::new(0).segments(), 1);
        assert_eq!(Frame::new(40).segments(), MAX_SEGMENTS as u8);
    }

    #[test]
    fn test_scroll_right() {
        let mut frame = Frame::new(1);
        frame.set_column(0, 0xFF);
        frame.set_column(7, 0x01);
        frame.scroll_right();
        assert_eq!(frame.column(0), 0);
        assert_eq!(frame.column(1), 0xFF);
        // The last column falls off the edge
        assert_eq!(frame.column(7), 0);
    }

    #[test]
    fn test_row_byte_msb_is_leftmost() {
        let mut frame = Frame::new(2);
        frame.set_pixel(0, 2, true);
        frame.set_pixel(15, 2, true);
        assert_eq!(frame.row_byte(0, 2), 0x80);
        assert_eq!(frame.row_byte(1, 2), 0x01);
        assert_eq!(frame.row_byte(0, 3), 0);
    }

    #[test]
    fn test_draw_target() {
        let mut frame = Frame::new(1);
        Line::new(Point::new(-2, 0), Point::new(9, 0))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut frame)
            .unwrap();
        assert_eq!(frame.row_byte(0, 0), 0xFF);
        assert_eq!(frame.size(), Size::new(8, 8));
    }
}
