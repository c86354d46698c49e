//! Driver for HUB75 RGB LED matrix panels wired straight to GPIO lines.
//!
//! The panel has no memory of its own: it has to be refreshed continuously,
//! row address by row address, with brightness produced by Binary Code
//! Modulation. [`RgbMatrix`] runs that refresh on a dedicated thread while
//! the caller draws into a [`FrameBuffer`]; finished frames are encoded into
//! bit planes and handed over between refresh frames, so the panel never
//! shows a mix of two frames.
//!
//! # Example
//! ```rust,no_run
//! # #[cfg(feature = "rpi")]
//! # fn main() -> Result<(), hub75_matrix::Hub75Error> {
//! use hub75_matrix::rpi::PinMap;
//! use hub75_matrix::scan::SpinDelay;
//! use hub75_matrix::MatrixConfig;
//! use hub75_matrix::PanelGeometry;
//! use hub75_matrix::RgbMatrix;
//!
//! let geometry = PanelGeometry::new(16, 2)?;
//! let gpio = rppal::gpio::Gpio::new()?;
//! let pins = PinMap::default().claim(&gpio, geometry.address_lines())?;
//! let mut matrix = RgbMatrix::start(geometry, pins, SpinDelay, MatrixConfig::default())?;
//!
//! matrix.fill(0xFF0000);
//! matrix.set_pixel_rgb(0, 0, 0, 255, 0)?;
//! matrix.stop()?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "rpi"))]
//! # fn main() {}
//! ```

mod color;
mod config;
mod error;
pub mod framebuffer;
pub mod geometry;
pub mod gpio;
mod matrix;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod scan;
pub mod swap;

#[cfg(test)]
mod testing;

pub use color::Color;
pub use color::ColorOrder;
pub use config::MatrixConfig;
pub use error::Hub75Error;
pub use framebuffer::FrameBuffer;
pub use geometry::PanelGeometry;
pub use geometry::RowInterleave;
pub use gpio::Hub75Pins;
pub use matrix::RgbMatrix;
