//! Binary Code Modulation (BCM) bit planes.
//!
//! A HUB75 LED is either on or off, so brightness is produced by time
//! weighting. Every channel value is scaled to the configured PWM depth and
//! split into its bits; plane `k` holds bit `k` of every channel and is
//! displayed for `2^k` dwell units. The time average over all planes gives
//! the channel's apparent brightness.
//!
//! # Memory Layout
//! [`BitPlanes`] stores one 8-bit [`Entry`] per clock pulse, ordered
//! `[plane][address][column]`. Each entry carries the color bits for the
//! upper half (`R1/G1/B1`) and lower half (`R2/G2/B2`) pixel that share the
//! row address.
//!
//! # Brightness Control
//! - `pwm_bits` sets the number of planes, 1 to 11
//! - channel values are scaled linearly, `v * (2^bits - 1) / 255`
//! - 8 bits displays the 8-bit input exactly, more bits only stretch it

use bitfield::bitfield;
use embedded_graphics::pixelcolor::RgbColor;

use super::FrameBuffer;
use crate::geometry::Half;
use crate::geometry::ScanPosition;
use crate::Color;
use crate::Hub75Error;
use crate::PanelGeometry;

/// Deepest modulation the encoder produces.
pub const MAX_PWM_BITS: u8 = 11;

bitfield! {
    /// One clock pulse worth of color data.
    ///
    /// The bit layout matches the order the lines are written:
    /// - Bit 5: Blue channel for color1
    /// - Bit 4: Green channel for color1
    /// - Bit 3: Red channel for color1
    /// - Bit 2: Blue channel for color0
    /// - Bit 1: Green channel for color0
    /// - Bit 0: Red channel for color0
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct Entry(u8);
    impl Debug;
    pub blu2, set_blu2: 5;
    pub grn2, set_grn2: 4;
    pub red2, set_red2: 3;
    pub blu1, set_blu1: 2;
    pub grn1, set_grn1: 1;
    pub red1, set_red1: 0;
}

#[cfg(feature = "defmt")]
impl defmt::Format for Entry {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Entry({=u8:#x})", self.0)
    }
}

impl Entry {
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    fn set_color0(&mut self, r: bool, g: bool, b: bool) {
        self.set_red1(r);
        self.set_grn1(g);
        self.set_blu1(b);
    }

    fn set_color1(&mut self, r: bool, g: bool, b: bool) {
        self.set_red2(r);
        self.set_grn2(g);
        self.set_blu2(b);
    }
}

/// Encoded planes for one complete frame.
#[derive(Clone, PartialEq, Eq)]
pub struct BitPlanes {
    planes: u8,
    rows: usize,
    columns: usize,
    generation: u64,
    entries: Vec<Entry>,
}

impl BitPlanes {
    /// An all-black frame for `geometry`.
    pub fn new(geometry: &PanelGeometry, planes: u8) -> Self {
        let mut this = Self {
            planes: 0,
            rows: 0,
            columns: 0,
            generation: 0,
            entries: Vec::new(),
        };
        this.reset(geometry, planes);
        this
    }

    pub fn planes(&self) -> u8 {
        self.planes
    }

    /// Row addresses per plane.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Entries shifted per row.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Publish sequence number, 0 for a frame that was never published.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Dwell units plane `plane` is displayed for.
    pub const fn weight(plane: u8) -> u32 {
        1 << plane
    }

    /// Entries of one row of one plane, in shift order.
    pub fn row(&self, plane: u8, address: usize) -> Option<&[Entry]> {
        if plane >= self.planes || address >= self.rows {
            return None;
        }
        let start = self.offset(plane, address);
        Some(&self.entries[start..start + self.columns])
    }

    /// Reassemble the scaled channel values stored for a scan position.
    pub fn sample(&self, position: ScanPosition) -> Option<[u16; 3]> {
        if position.column >= self.columns {
            return None;
        }
        let mut value = [0u16; 3];
        for plane in 0..self.planes {
            let entry = self.row(plane, position.address)?[position.column];
            let bits = match position.half {
                Half::Upper => [entry.red1(), entry.grn1(), entry.blu1()],
                Half::Lower => [entry.red2(), entry.grn2(), entry.blu2()],
            };
            for (channel, bit) in value.iter_mut().zip(bits) {
                *channel |= u16::from(bit) << plane;
            }
        }
        Some(value)
    }

    /// Copy the entries of `other`, keeping this allocation.
    pub(crate) fn copy_from(&mut self, other: &BitPlanes) {
        self.planes = other.planes;
        self.rows = other.rows;
        self.columns = other.columns;
        self.entries.clone_from(&other.entries);
    }

    // resize for the geometry and blank every entry
    fn reset(&mut self, geometry: &PanelGeometry, planes: u8) {
        self.planes = planes;
        self.rows = geometry.rows();
        self.columns = geometry.chain_columns();
        self.entries.clear();
        self.entries
            .resize(planes as usize * self.rows * self.columns, Entry::new());
    }

    fn offset(&self, plane: u8, address: usize) -> usize {
        (plane as usize * self.rows + address) * self.columns
    }
}

impl core::fmt::Debug for BitPlanes {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BitPlanes")
            .field("planes", &self.planes)
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Converts 24-bit frames into [`BitPlanes`].
#[derive(Clone)]
pub struct BitPlaneEncoder {
    bits: u8,
    scale: [u16; 256],
}

impl BitPlaneEncoder {
    pub fn new(bits: u8) -> Result<Self, Hub75Error> {
        if bits == 0 || bits > MAX_PWM_BITS {
            return Err(Hub75Error::InvalidConfig("pwm bits must be between 1 and 11"));
        }
        let max = (1u32 << bits) - 1;
        let mut scale = [0u16; 256];
        for (value, scaled) in scale.iter_mut().enumerate() {
            *scaled = ((value as u32 * max + 127) / 255) as u16;
        }
        Ok(Self { bits, scale })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Channel value as displayed at this depth.
    pub fn scale(&self, value: u8) -> u16 {
        self.scale[value as usize]
    }

    /// Encode `fb` into `out`, reusing its allocation.
    pub fn encode(&self, fb: &FrameBuffer, geometry: &PanelGeometry, out: &mut BitPlanes) {
        out.reset(geometry, self.bits);
        for (x, y, color) in fb.pixels() {
            if color == Color::BLACK {
                continue;
            }
            if let Some(position) = geometry.map(x, y) {
                self.write(out, position, color);
            }
        }
    }

    /// Re-encode the single pixel at `x, y`, leaving every other entry alone.
    ///
    /// `out` must hold a frame encoded at this depth for `geometry`.
    pub fn encode_pixel(
        &self,
        geometry: &PanelGeometry,
        out: &mut BitPlanes,
        x: usize,
        y: usize,
        color: Color,
    ) -> Result<(), Hub75Error> {
        if out.planes != self.bits || out.rows != geometry.rows() {
            return Err(Hub75Error::InvalidConfig("planes were encoded for another layout"));
        }
        let position = geometry.map(x, y).ok_or(Hub75Error::OutOfRange {
            x,
            y,
            width: geometry.width(),
            height: geometry.height(),
        })?;
        self.write(out, position, color);
        Ok(())
    }

    /// Encode a frame of a single color into `out`.
    pub fn encode_fill(&self, geometry: &PanelGeometry, out: &mut BitPlanes, color: Color) {
        out.reset(geometry, self.bits);
        if color == Color::BLACK {
            return;
        }
        let (r, g, b) = self.scaled(color);
        let per_plane = out.rows * out.columns;
        for (plane, entries) in out.entries.chunks_mut(per_plane).enumerate() {
            let on = |value: u16| (value >> plane) & 1 != 0;
            let mut entry = Entry::new();
            entry.set_color0(on(r), on(g), on(b));
            entry.set_color1(on(r), on(g), on(b));
            entries.fill(entry);
        }
    }

    fn scaled(&self, color: Color) -> (u16, u16, u16) {
        (
            self.scale(color.r()),
            self.scale(color.g()),
            self.scale(color.b()),
        )
    }

    // overwrites every plane's bits for the position, black included
    fn write(&self, out: &mut BitPlanes, position: ScanPosition, color: Color) {
        let (r, g, b) = self.scaled(color);
        for plane in 0..self.bits {
            let offset = out.offset(plane, position.address) + position.column;
            let entry = &mut out.entries[offset];
            let on = |value: u16| (value >> plane) & 1 != 0;
            match position.half {
                Half::Upper => entry.set_color0(on(r), on(g), on(b)),
                Half::Lower => entry.set_color1(on(r), on(g), on(b)),
            }
        }
    }
}

impl core::fmt::Debug for BitPlaneEncoder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BitPlaneEncoder")
            .field("bits", &self.bits)
            .finish()
    }
}
