use anyhow::bail;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::Pixel;

/// One-bit-per-pixel pixel grid, row-major, MSB-first within a byte.
///
/// In memory a set bit means an inked (black) pixel, so a zeroed buffer is a
/// blank white page. The panel wires the opposite convention, which is why
/// every packed transmission byte is complemented on the way out.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width.div_ceil(8) as usize;
        Self {
            width,
            height,
            stride,
            data: vec![0; stride * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set all pixels at once, bypassing per-pixel addressing.
    pub fn fill(&mut self, inked: bool) {
        let byte = if inked { 0xFF } else { 0x00 };
        self.data.fill(byte);
    }

    /// Set a single pixel. Out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, inked: bool) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }

        let index = y as usize * self.stride + x as usize / 8;
        let mask = 0x80u8 >> (x as usize % 8);
        if inked {
            self.data[index] |= mask;
        } else {
            self.data[index] &= !mask;
        }
    }

    /// Whether the pixel at `(x, y)` is inked. Out of bounds reads as blank.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }

        let index = y as usize * self.stride + x as usize / 8;
        let mask = 0x80u8 >> (x as usize % 8);
        self.data[index] & mask != 0
    }

    /// Validate that `region` is non-empty and lies within the grid,
    /// returning its coordinates as unsigned values.
    pub(crate) fn check_region(&self, region: &Rectangle) -> anyhow::Result<(u32, u32, u32, u32)> {
        let Point { x, y } = region.top_left;
        let Size { width, height } = region.size;

        if x < 0
            || y < 0
            || width == 0
            || height == 0
            || x as u32 + width > self.width
            || y as u32 + height > self.height
        {
            bail!(
                "Region {:?} outside the {}x{} pixel grid",
                region,
                self.width,
                self.height
            );
        }

        Ok((x as u32, y as u32, width, height))
    }

    /// Copy `region` out into a standalone buffer of its own size.
    pub fn extract(&self, region: &Rectangle) -> anyhow::Result<FrameBuffer> {
        let (x, y, width, height) = self.check_region(region)?;

        let mut out = FrameBuffer::new(width, height);
        for row in 0..height {
            for col in 0..width {
                if self.pixel(x + col, y + row) {
                    out.set_pixel(col as i32, row as i32, true);
                }
            }
        }

        Ok(out)
    }

    /// Copy a standalone buffer back into the grid at `top_left`.
    pub fn insert(&mut self, top_left: Point, region: &FrameBuffer) -> anyhow::Result<()> {
        let rect = Rectangle::new(top_left, Size::new(region.width, region.height));
        let (x, y, width, height) = self.check_region(&rect)?;

        for row in 0..height {
            for col in 0..width {
                self.set_pixel(
                    (x + col) as i32,
                    (y + row) as i32,
                    region.pixel(col, row),
                );
            }
        }

        Ok(())
    }

    /// Pack the whole grid for a full-panel transmission, complementing
    /// every byte into the panel's polarity.
    pub fn pack_full(&self) -> Vec<u8> {
        self.data.iter().map(|byte| !byte).collect()
    }

    /// Pack `region` for a partial transmission.
    ///
    /// The horizontal span is widened outward to whole-byte boundaries
    /// because the panel addresses bytes, not pixels. The widening applies
    /// to this buffer only; the caller keeps transmitting the original
    /// pixel rectangle.
    pub fn pack_partial(&self, region: &Rectangle) -> anyhow::Result<Vec<u8>> {
        let (x, y, width, height) = self.check_region(region)?;

        let x0 = (x / 8) as usize;
        let x1 = (x + width).div_ceil(8) as usize;
        let scan = x1 - x0;

        let mut packed = Vec::with_capacity(scan * height as usize);
        for row in y..y + height {
            let start = row as usize * self.stride + x0;
            packed.extend(self.data[start..start + scan].iter().map(|byte| !byte));
        }

        Ok(packed)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}
