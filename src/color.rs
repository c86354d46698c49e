//! Pixel colors and the byte order used for packed and bulk color data.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::pixelcolor::RgbColor;

pub type Color = Rgb888;

/// Order of the three channel bytes in packed colors and bulk frame loads.
///
/// The first listed channel is the most significant byte of a packed
/// `0x00AABBCC` value and the first byte of each pixel in a bulk load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorOrder {
    #[default]
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ColorOrder {
    // positions of red, green and blue in the three byte sequence
    const fn positions(self) -> [usize; 3] {
        match self {
            ColorOrder::Rgb => [0, 1, 2],
            ColorOrder::Rbg => [0, 2, 1],
            ColorOrder::Grb => [1, 0, 2],
            ColorOrder::Gbr => [2, 0, 1],
            ColorOrder::Brg => [1, 2, 0],
            ColorOrder::Bgr => [2, 1, 0],
        }
    }

    /// Decode one pixel from three bytes in this order.
    pub fn decode(self, bytes: [u8; 3]) -> Color {
        let [r, g, b] = self.positions();
        Color::new(bytes[r], bytes[g], bytes[b])
    }

    /// Encode a color into three bytes in this order.
    pub fn encode(self, color: Color) -> [u8; 3] {
        let [r, g, b] = self.positions();
        let mut bytes = [0u8; 3];
        bytes[r] = color.r();
        bytes[g] = color.g();
        bytes[b] = color.b();
        bytes
    }

    /// Decode a packed 24-bit color, ignoring the top byte.
    pub fn unpack(self, packed: u32) -> Color {
        let [_, a, b, c] = packed.to_be_bytes();
        self.decode([a, b, c])
    }

    pub fn pack(self, color: Color) -> u32 {
        let [a, b, c] = self.encode(color);
        u32::from_be_bytes([0, a, b, c])
    }
}
