//! Recording output pins for unit tests.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::ErrorKind;
use embedded_hal::digital::ErrorType;
use embedded_hal::digital::OutputPin;

use crate::gpio::Hub75Pins;

const ADDR_NAMES: [&str; 5] = ["A", "B", "C", "D", "E"];

/// Shared log of every pin write.
#[derive(Clone, Default)]
pub struct Board {
    events: Arc<Mutex<Vec<(&'static str, bool)>>>,
    record: bool,
    fail: Arc<AtomicBool>,
}

impl Board {
    pub fn new() -> Self {
        Self {
            record: true,
            ..Default::default()
        }
    }

    /// A board that accepts writes without logging them.
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn pin(&self, name: &'static str) -> MockPin {
        MockPin {
            name,
            board: self.clone(),
        }
    }

    pub fn pins(&self, address_lines: usize) -> Hub75Pins<MockPin> {
        Hub75Pins {
            red1: self.pin("R1"),
            grn1: self.pin("G1"),
            blu1: self.pin("B1"),
            red2: self.pin("R2"),
            grn2: self.pin("G2"),
            blu2: self.pin("B2"),
            addr: ADDR_NAMES[..address_lines]
                .iter()
                .copied()
                .map(|name| self.pin(name))
                .collect(),
            blank: self.pin("OE"),
            clock: self.pin("CLK"),
            latch: self.pin("LAT"),
        }
    }

    /// Make every following write fail.
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<(&'static str, bool)> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Last level written to `name`, low if never written.
    pub fn level(&self, name: &str) -> bool {
        self.events()
            .iter()
            .rev()
            .find(|(pin, _)| *pin == name)
            .is_some_and(|(_, high)| *high)
    }

    pub fn writes(&self, name: &str) -> usize {
        self.events().iter().filter(|(pin, _)| *pin == name).count()
    }

    /// Level of `name` at every rising clock edge in the current log.
    pub fn clocked(&self, name: &str) -> Vec<bool> {
        let mut level = false;
        let mut clock = false;
        let mut sampled = Vec::new();
        for (pin, high) in self.events() {
            if pin == name {
                level = high;
            } else if pin == "CLK" {
                if high && !clock {
                    sampled.push(level);
                }
                clock = high;
            }
        }
        sampled
    }

    /// Low to high transitions of `name` in the current log.
    pub fn rises(&self, name: &str) -> usize {
        let mut levels: HashMap<&str, bool> = HashMap::new();
        let mut rises = 0;
        for (pin, high) in self.events() {
            let was = levels.insert(pin, high).unwrap_or(false);
            if pin == name && high && !was {
                rises += 1;
            }
        }
        rises
    }
}

#[derive(Clone)]
pub struct MockPin {
    name: &'static str,
    board: Board,
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl MockPin {
    fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
        if self.board.fail.load(Ordering::SeqCst) {
            return Err(ErrorKind::Other);
        }
        if self.board.record {
            self.board.events.lock().unwrap().push((self.name, high));
        }
        Ok(())
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

/// Delay that only records the requested durations.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    delays: Arc<Mutex<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn delays(&self) -> Vec<u32> {
        self.delays.lock().unwrap().clone()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays.lock().unwrap().push(ns);
    }
}
