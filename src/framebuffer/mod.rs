//! Writer side pixel storage.
//!
//! [`FrameBuffer`] holds the logical 24-bit color of every pixel in row-major
//! order. It is owned by the writer; the scan thread never reads it directly.
//! Instead a [`bitplane::BitPlaneEncoder`] turns a finished frame into
//! [`bitplane::BitPlanes`] which are then handed over by the swap
//! coordinator.
//!
//! # Example
//! ```rust
//! use embedded_graphics::pixelcolor::RgbColor;
//! use embedded_graphics::prelude::*;
//! use embedded_graphics::primitives::PrimitiveStyle;
//! use embedded_graphics::primitives::Rectangle;
//! use hub75_matrix::Color;
//! use hub75_matrix::FrameBuffer;
//! use hub75_matrix::PanelGeometry;
//!
//! let geometry = PanelGeometry::new(16, 2).unwrap();
//! let mut framebuffer = FrameBuffer::new(&geometry);
//!
//! Rectangle::new(Point::new(10, 10), Size::new(20, 20))
//!     .into_styled(PrimitiveStyle::with_fill(Color::RED))
//!     .draw(&mut framebuffer)
//!     .unwrap();
//!
//! assert_eq!(framebuffer.get_pixel(10, 10), Some(Color::RED));
//! ```

use core::convert::Infallible;

use embedded_graphics::geometry::OriginDimensions;
use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::RgbColor;
use embedded_graphics::Pixel;

use crate::Color;
use crate::ColorOrder;
use crate::Hub75Error;
use crate::PanelGeometry;

pub mod bitplane;

/// Bytes per pixel in a bulk frame load.
pub const BYTES_PER_PIXEL: usize = 3;

#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    order: ColorOrder,
    data: Vec<Color>,
}

impl FrameBuffer {
    /// Create a black frame sized for `geometry`.
    pub fn new(geometry: &PanelGeometry) -> Self {
        Self::with_order(geometry, ColorOrder::default())
    }

    /// Create a black frame whose packed and bulk colors use `order`.
    pub fn with_order(geometry: &PanelGeometry, order: ColorOrder) -> Self {
        let width = geometry.width();
        let height = geometry.height();
        Self {
            width,
            height,
            order,
            data: vec![Color::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn color_order(&self) -> ColorOrder {
        self.order
    }

    /// Length in bytes [`FrameBuffer::set_buffer`] expects.
    pub fn byte_len(&self) -> usize {
        self.data.len() * BYTES_PER_PIXEL
    }

    /// Clear the frame buffer to black.
    pub fn clear(&mut self) {
        self.fill(Color::BLACK);
    }

    pub fn fill(&mut self, color: Color) {
        self.data.fill(color);
    }

    /// Fill with a packed `0xRRGGBB` value, byte order per [`ColorOrder`].
    pub fn fill_packed(&mut self, packed: u32) {
        self.fill(self.order.unpack(packed));
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) -> Result<(), Hub75Error> {
        let index = self.index(x, y).ok_or(Hub75Error::OutOfRange {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.data[index] = color;
        Ok(())
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Color> {
        self.index(x, y).map(|index| self.data[index])
    }

    /// Row `y`, left to right.
    pub fn row(&self, y: usize) -> Option<&[Color]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&self.data[start..start + self.width])
    }

    /// Replace the whole frame from row-major bytes, three per pixel.
    ///
    /// The frame is left untouched when the length is wrong.
    pub fn set_buffer(&mut self, bytes: &[u8]) -> Result<(), Hub75Error> {
        if bytes.len() != self.byte_len() {
            return Err(Hub75Error::SizeMismatch {
                expected: self.byte_len(),
                actual: bytes.len(),
            });
        }
        for (pixel, chunk) in self.data.iter_mut().zip(bytes.chunks_exact(BYTES_PER_PIXEL)) {
            *pixel = self.order.decode([chunk[0], chunk[1], chunk[2]]);
        }
        Ok(())
    }

    /// The frame as row-major bytes in the configured order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data
            .iter()
            .flat_map(|color| self.order.encode(*color))
            .collect()
    }

    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, Color)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(|(i, color)| (i % self.width, i / self.width, *color))
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }
}

impl core::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("order", &self.order)
            .finish()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl embedded_graphics::draw_target::DrawTarget for FrameBuffer {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if p.x < 0 || p.y < 0 {
                continue;
            }
            // off-screen pixels are clipped
            let _ = self.set_pixel(p.x as usize, p.y as usize, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}
