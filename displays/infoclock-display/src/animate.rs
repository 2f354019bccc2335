//! Text and transition effects
//!
//! [`Animator`] owns the frame buffer, the text canvas and the backend, and
//! paces multi-frame effects with an async delay. It is the device that the
//! display tasks take turns holding.

use embedded_hal_async::delay::DelayNs;

use crate::backend::{DisplayError, MatrixBackend};
use crate::canvas::Canvas;
use crate::frame::Frame;
use crate::log::trace;

/// Renders text and effects onto a matrix
pub struct Animator<B, D> {
    backend: B,
    delay: D,
    frame: Frame,
    canvas: Canvas,
}

impl<B: MatrixBackend, D: DelayNs> Animator<B, D> {
    /// Create an animator sized to the backend's module chain
    pub fn new(backend: B, delay: D) -> Self {
        let frame = Frame::new(backend.segments());
        Self {
            backend,
            delay,
            frame,
            canvas: Canvas::new(),
        }
    }

    /// Width of the matrix in pixels
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// The frame as last drawn
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Draw directly into the frame; call [`flush`](Self::flush) to show it
    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Push the frame to the hardware
    pub async fn flush(&mut self) -> Result<(), DisplayError> {
        self.backend.flush(&self.frame).await
    }

    /// Blank the matrix
    pub async fn clear(&mut self) -> Result<(), DisplayError> {
        self.frame.clear();
        self.flush().await
    }

    /// Show `text` starting at column `x`, clipped at the right edge
    pub async fn show_at(&mut self, x: usize, text: &str) -> Result<(), DisplayError> {
        self.canvas.print(text);
        self.frame.clear();
        self.canvas.blit(0, &mut self.frame, x);
        self.flush().await
    }

    /// Show `text` centred, then hold it for `hold_ms`
    ///
    /// Text wider than the matrix is shown from its left edge.
    pub async fn show_centered(&mut self, text: &str, hold_ms: u32) -> Result<(), DisplayError> {
        let width = self.canvas.print(text);
        let offset = self.width().saturating_sub(width) / 2;
        self.frame.clear();
        self.canvas.blit(0, &mut self.frame, offset);
        self.flush().await?;
        self.delay.delay_ms(hold_ms).await;
        Ok(())
    }

    /// Scroll `text` across the matrix, one column every `speed_ms`
    ///
    /// Text that fits is centred instead and held for ten steps. Longer
    /// text is laid out a slice at a time as it moves, so any length scrolls.
    pub async fn scroll_message(&mut self, text: &str, speed_ms: u32) -> Result<(), DisplayError> {
        let width = self.canvas.print(text);
        let visible = self.width();
        if width <= visible {
            return self.show_centered(text, 10 * speed_ms).await;
        }

        trace!("display: scrolling {} columns", width - visible);
        for offset in 0..width - visible {
            if !self.canvas.covers(offset, visible) {
                self.canvas.print_from(text, offset);
            }
            self.canvas.blit(offset, &mut self.frame, 0);
            self.flush().await?;
            self.delay.delay_ms(speed_ms).await;
        }
        Ok(())
    }

    /// Blank the matrix column by column from the left
    pub async fn wipe_left_to_right(&mut self, speed_ms: u32) -> Result<(), DisplayError> {
        for x in 0..self.width() {
            self.frame.set_column(x, 0);
            self.flush().await?;
            self.delay.delay_ms(speed_ms).await;
        }
        Ok(())
    }

    /// Push the current content off the right edge
    pub async fn scroll_out_right(&mut self, speed_ms: u32) -> Result<(), DisplayError> {
        for _ in 0..self.width() {
            self.frame.scroll_right();
            self.flush().await?;
            self.delay.delay_ms(speed_ms).await;
        }
        Ok(())
    }
}
