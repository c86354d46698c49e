#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::ErrorKind;
use embedded_hal::digital::ErrorType;
use embedded_hal::digital::OutputPin;
use hub75_matrix::Hub75Pins;

/// Counts writes and drops of the pins it hands out, and records the
/// written levels once [`Harness::record`] is called.
#[derive(Clone, Default)]
pub struct Harness {
    fail: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
    recording: Arc<AtomicBool>,
    events: Arc<Mutex<Vec<(&'static str, bool)>>>,
}

impl Harness {
    pub fn pins(&self, address_lines: usize) -> Hub75Pins<TestPin> {
        Hub75Pins {
            red1: self.pin("R1"),
            grn1: self.pin("G1"),
            blu1: self.pin("B1"),
            red2: self.pin("R2"),
            grn2: self.pin("G2"),
            blu2: self.pin("B2"),
            addr: (0..address_lines).map(|_| self.pin("ADDR")).collect(),
            blank: self.pin("OE"),
            clock: self.pin("CLK"),
            latch: self.pin("LAT"),
        }
    }

    fn pin(&self, name: &'static str) -> TestPin {
        TestPin {
            name,
            harness: self.clone(),
        }
    }

    pub fn record(&self) {
        self.recording.store(true, Ordering::SeqCst);
    }

    /// Drain the recorded writes, returning the level of each color line at
    /// every rising clock edge.
    pub fn take_clocked(&self) -> Vec<[bool; 6]> {
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        let mut colors = [false; 6];
        let mut clock = false;
        let mut sampled = Vec::new();
        for (pin, high) in events {
            match pin {
                "R1" => colors[0] = high,
                "G1" => colors[1] = high,
                "B1" => colors[2] = high,
                "R2" => colors[3] = high,
                "G2" => colors[4] = high,
                "B2" => colors[5] = high,
                "CLK" => {
                    if high && !clock {
                        sampled.push(colors);
                    }
                    clock = high;
                }
                _ => {}
            }
        }
        sampled
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

pub struct TestPin {
    name: &'static str,
    harness: Harness,
}

impl Drop for TestPin {
    fn drop(&mut self) {
        self.harness.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

impl ErrorType for TestPin {
    type Error = ErrorKind;
}

impl OutputPin for TestPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

impl TestPin {
    fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
        if self.harness.fail.load(Ordering::SeqCst) {
            return Err(ErrorKind::Other);
        }
        self.harness.writes.fetch_add(1, Ordering::SeqCst);
        if self.harness.recording.load(Ordering::SeqCst) {
            self.harness.events.lock().unwrap().push((self.name, high));
        }
        Ok(())
    }
}

/// Returns immediately.
#[derive(Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
