use std::time::Duration;

use crate::framebuffer::bitplane::MAX_PWM_BITS;
use crate::ColorOrder;
use crate::Hub75Error;
use crate::PanelGeometry;

/// Runtime settings of an [`crate::RgbMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixConfig {
    /// Bit planes per frame, 1 to 11.
    pub pwm_bits: u8,
    /// Display time of the least significant plane.
    pub base_dwell_ns: u32,
    /// Byte order of packed colors and bulk frame loads.
    pub color_order: ColorOrder,
    /// How often the scan thread updates the measured refresh rate.
    pub stats_interval: Duration,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            pwm_bits: 8,
            base_dwell_ns: 200,
            color_order: ColorOrder::Rgb,
            stats_interval: Duration::from_secs(1),
        }
    }
}

impl MatrixConfig {
    pub fn with_pwm_bits(mut self, pwm_bits: u8) -> Self {
        self.pwm_bits = pwm_bits;
        self
    }

    pub fn with_base_dwell_ns(mut self, base_dwell_ns: u32) -> Self {
        self.base_dwell_ns = base_dwell_ns;
        self
    }

    pub fn with_color_order(mut self, color_order: ColorOrder) -> Self {
        self.color_order = color_order;
        self
    }

    pub fn with_stats_interval(mut self, stats_interval: Duration) -> Self {
        self.stats_interval = stats_interval;
        self
    }

    pub fn validate(&self) -> Result<(), Hub75Error> {
        if self.pwm_bits == 0 || self.pwm_bits > MAX_PWM_BITS {
            return Err(Hub75Error::InvalidConfig("pwm bits must be between 1 and 11"));
        }
        if self.base_dwell_ns == 0 {
            return Err(Hub75Error::InvalidConfig("base dwell must be positive"));
        }
        if self.stats_interval.is_zero() {
            return Err(Hub75Error::InvalidConfig("stats interval must be positive"));
        }
        Ok(())
    }

    /// Total LED on-time of one frame, ignoring shifting overhead.
    pub fn frame_dwell_ns(&self, geometry: &PanelGeometry) -> u64 {
        let weights = (1u64 << self.pwm_bits) - 1;
        geometry.rows() as u64 * weights * self.base_dwell_ns as u64
    }
}
