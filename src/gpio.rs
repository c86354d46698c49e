use embedded_hal::digital::OutputPin;
use embedded_hal::digital::PinState;

use crate::framebuffer::bitplane::Entry;
use crate::Hub75Error;

/// Output lines of a HUB75 connector.
///
/// `addr` holds the row address lines in order `A, B, C, D, E`; only as many
/// as the panel multiplexing needs are driven, extra lines are left low.
#[derive(Debug)]
pub struct Hub75Pins<P> {
    pub red1: P,
    pub grn1: P,
    pub blu1: P,
    pub red2: P,
    pub grn2: P,
    pub blu2: P,
    pub addr: Vec<P>,
    pub blank: P,
    pub clock: P,
    pub latch: P,
}

/// Bit-banged HUB75 signal output.
pub struct Hub75<P: OutputPin> {
    pins: Hub75Pins<P>,
    address_lines: usize,
}

fn write<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), Hub75Error> {
    pin.set_state(PinState::from(high)).map_err(Hub75Error::gpio)
}

impl<P: OutputPin> Hub75<P> {
    /// Take ownership of `pins` and drive them to a blanked idle state.
    pub fn new(pins: Hub75Pins<P>, address_lines: usize) -> Result<Self, Hub75Error> {
        if pins.addr.len() < address_lines {
            return Err(Hub75Error::MissingAddressLine {
                needed: address_lines,
                supplied: pins.addr.len(),
            });
        }
        let mut this = Self {
            pins,
            address_lines,
        };
        this.blank(true)?;
        write(&mut this.pins.clock, false)?;
        write(&mut this.pins.latch, false)?;
        this.set_color(Entry::new())?;
        for pin in this.pins.addr.iter_mut() {
            write(pin, false)?;
        }
        Ok(this)
    }

    pub fn address_lines(&self) -> usize {
        self.address_lines
    }

    pub fn set_address(&mut self, addr: usize) -> Result<(), Hub75Error> {
        for (bit, pin) in self.pins.addr[..self.address_lines].iter_mut().enumerate() {
            write(pin, addr & (1 << bit) != 0)?;
        }
        Ok(())
    }

    fn set_color(&mut self, entry: Entry) -> Result<(), Hub75Error> {
        write(&mut self.pins.red1, entry.red1())?;
        write(&mut self.pins.grn1, entry.grn1())?;
        write(&mut self.pins.blu1, entry.blu1())?;
        write(&mut self.pins.red2, entry.red2())?;
        write(&mut self.pins.grn2, entry.grn2())?;
        write(&mut self.pins.blu2, entry.blu2())
    }

    /// Present one entry on the color lines and pulse the clock.
    pub fn clock_in(&mut self, entry: Entry) -> Result<(), Hub75Error> {
        self.set_color(entry)?;
        self.clock()
    }

    pub fn clock(&mut self) -> Result<(), Hub75Error> {
        write(&mut self.pins.clock, true)?;
        write(&mut self.pins.clock, false)
    }

    /// Shift a whole row into the chain, first entry first.
    pub fn shift_row(&mut self, entries: &[Entry]) -> Result<(), Hub75Error> {
        for entry in entries {
            self.clock_in(*entry)?;
        }
        Ok(())
    }

    /// Shift `columns` black entries into the chain.
    pub fn shift_blank(&mut self, columns: usize) -> Result<(), Hub75Error> {
        self.set_color(Entry::new())?;
        for _ in 0..columns {
            self.clock()?;
        }
        Ok(())
    }

    /// Move the shifted row into the output drivers.
    pub fn latch(&mut self) -> Result<(), Hub75Error> {
        write(&mut self.pins.latch, true)?;
        write(&mut self.pins.latch, false)
    }

    /// Turn the LEDs off (`true`) or back on.
    ///
    /// Output enable is active low, unless the `invert-blank` feature is set.
    pub fn blank(&mut self, state: bool) -> Result<(), Hub75Error> {
        let level = if cfg!(feature = "invert-blank") {
            !state
        } else {
            state
        };
        write(&mut self.pins.blank, level)
    }

    /// Give the pins back.
    pub fn release(self) -> Hub75Pins<P> {
        self.pins
    }
}
