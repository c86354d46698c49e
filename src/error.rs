use embedded_hal::digital::ErrorKind;
use thiserror::Error;

/// Errors reported by the HUB75 driver.
#[derive(Debug, Error)]
pub enum Hub75Error {
    /// The panel geometry or driver configuration cannot be driven.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A pixel coordinate lies outside the display.
    #[error("pixel ({x}, {y}) is outside the {width}x{height} display")]
    OutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    /// A bulk frame load does not match the display size.
    #[error("frame buffer expects {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    /// Fewer address pins were supplied than the panel multiplexing needs.
    #[error("panel needs {needed} address lines, {supplied} supplied")]
    MissingAddressLine { needed: usize, supplied: usize },
    /// Writing an output pin failed.
    #[error("gpio write failed: {0}")]
    Gpio(ErrorKind),
    /// The refresh thread could not be started.
    #[error("failed to spawn scan thread")]
    Spawn(#[source] std::io::Error),
    /// The refresh thread panicked before it could hand back the pins.
    #[error("scan thread panicked")]
    ScanThreadPanicked,
    #[cfg(feature = "rpi")]
    #[error(transparent)]
    Rpi(#[from] rppal::gpio::Error),
}

impl Hub75Error {
    pub(crate) fn gpio<E: embedded_hal::digital::Error>(error: E) -> Self {
        Self::Gpio(error.kind())
    }
}
