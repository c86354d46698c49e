//! Raspberry Pi GPIO lines through `rppal`.

use log::debug;
use rppal::gpio::Gpio;
use rppal::gpio::OutputPin;

use crate::Hub75Error;
use crate::Hub75Pins;

/// BCM GPIO numbers of the HUB75 signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub red1: u8,
    pub grn1: u8,
    pub blu1: u8,
    pub red2: u8,
    pub grn2: u8,
    pub blu2: u8,
    /// `A, B, C, D, E`
    pub addr: [u8; 5],
    pub blank: u8,
    pub clock: u8,
    pub latch: u8,
}

impl PinMap {
    /// Direct wiring of a single chain to the 40 pin header.
    pub const REGULAR: Self = Self {
        red1: 11,
        grn1: 27,
        blu1: 7,
        red2: 8,
        grn2: 9,
        blu2: 10,
        addr: [22, 23, 24, 25, 15],
        blank: 18,
        clock: 17,
        latch: 4,
    };

    /// Claim the output lines, enough address lines for `address_lines`.
    ///
    /// The lines are reset to inputs when the returned pins are dropped.
    pub fn claim(
        &self,
        gpio: &Gpio,
        address_lines: usize,
    ) -> Result<Hub75Pins<OutputPin>, Hub75Error> {
        if address_lines > self.addr.len() {
            return Err(Hub75Error::MissingAddressLine {
                needed: address_lines,
                supplied: self.addr.len(),
            });
        }
        let output = |pin: u8| -> Result<OutputPin, Hub75Error> {
            Ok(gpio.get(pin)?.into_output_low())
        };
        let addr = self.addr[..address_lines]
            .iter()
            .map(|pin| output(*pin))
            .collect::<Result<Vec<_>, _>>()?;
        // claim output enable in its blanked state so the panel stays dark
        let blank = gpio.get(self.blank)?;
        let blank = if cfg!(feature = "invert-blank") {
            blank.into_output_low()
        } else {
            blank.into_output_high()
        };
        debug!("claimed hub75 gpio lines {self:?}");
        Ok(Hub75Pins {
            red1: output(self.red1)?,
            grn1: output(self.grn1)?,
            blu1: output(self.blu1)?,
            red2: output(self.red2)?,
            grn2: output(self.grn2)?,
            blu2: output(self.blu2)?,
            addr,
            blank,
            clock: output(self.clock)?,
            latch: output(self.latch)?,
        })
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::REGULAR
    }
}
