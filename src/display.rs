use anyhow::Result;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::framebuffer::FrameBuffer;
use crate::panel::Panel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Full-panel refresh, flickers but resets ghosting.
    Full,
    /// Region-scoped refresh for routine UI updates.
    Partial,
}

/// Owns the framebuffer and the panel driver. The framebuffer is the single
/// source of truth for panel content; packed buffers are built per
/// transmission and never kept.
pub struct Display<P> {
    panel: P,
    frame: FrameBuffer,
}

impl<P: Panel> Display<P> {
    pub fn new(panel: P, width: u32, height: u32) -> Self {
        Self {
            panel,
            frame: FrameBuffer::new(width, height),
        }
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn set_mode(&mut self, mode: DisplayMode) -> Result<()> {
        match mode {
            DisplayMode::Full => self.panel.init(),
            DisplayMode::Partial => self.panel.init_partial_mode(),
        }
    }

    /// Blank both the in-memory frame and the physical panel.
    pub fn clear(&mut self) -> Result<()> {
        self.frame.fill(false);
        self.panel.clear()
    }

    /// Run `paint` against a copy of `region`, then write the result back
    /// into the frame. Does not transmit anything.
    pub fn compose<F>(&mut self, region: &Rectangle, paint: F) -> Result<()>
    where
        F: FnOnce(&mut FrameBuffer) -> Result<()>,
    {
        let mut canvas = self.frame.extract(region)?;
        paint(&mut canvas)?;
        self.frame.insert(region.top_left, &canvas)
    }

    /// Transmit the whole frame.
    pub fn refresh_full(&mut self) -> Result<()> {
        self.panel.display(&self.frame.pack_full())
    }

    /// Transmit exactly `region`. The scan buffer is byte-expanded but the
    /// panel is addressed with the original pixel rectangle.
    pub fn refresh_region(&mut self, region: &Rectangle) -> Result<()> {
        let (x, y, width, height) = self.frame.check_region(region)?;
        let packed = self.frame.pack_partial(region)?;
        self.panel
            .display_partial(&packed, x, y, x + width, y + height)
    }
}
