//! The refresh loop.
//!
//! [`ScanDriver`] walks every row address and, for each row, every bit
//! plane: it selects the row, shifts the plane's entries into the chain,
//! latches them and keeps the LEDs on for a time proportional to the plane's
//! weight. One full walk is a frame. New frames from the writer are only
//! picked up between frames, so a frame is never shown half old, half new.
//!
//! ```text
//! Idle -> RowSelect -> ShiftData -> Latch -> DisplayDwell -+
//!            ^                                             |
//!            +---------------------------------------------+
//! ```
//!
//! `Stopped` is entered only through [`ScanDriver::stop`].

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::debug;
use log::error;
use log::info;

use crate::framebuffer::bitplane::BitPlanes;
use crate::gpio::Hub75;
use crate::gpio::Hub75Pins;
use crate::swap::ScanBuffers;
use crate::Hub75Error;
use crate::PanelGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    RowSelect,
    ShiftData,
    Latch,
    DisplayDwell,
    Stopped,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ScanState {
    fn format(&self, f: defmt::Formatter) {
        let name = match self {
            ScanState::Idle => "Idle",
            ScanState::RowSelect => "RowSelect",
            ScanState::ShiftData => "ShiftData",
            ScanState::Latch => "Latch",
            ScanState::DisplayDwell => "DisplayDwell",
            ScanState::Stopped => "Stopped",
        };
        defmt::write!(f, "{=str}", name)
    }
}

/// Busy-waiting [`DelayNs`] that never yields the thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let start = Instant::now();
        let wait = Duration::from_nanos(ns as u64);
        while start.elapsed() < wait {
            core::hint::spin_loop();
        }
    }
}

struct RefreshStats {
    rate: Arc<AtomicU32>,
    interval: Duration,
    window_start: Instant,
    frames: u32,
}

impl RefreshStats {
    fn new(interval: Duration) -> Self {
        Self {
            rate: Arc::new(AtomicU32::new(0)),
            interval,
            window_start: Instant::now(),
            frames: 0,
        }
    }

    fn record_frame(&mut self) {
        self.frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= self.interval {
            let rate = (self.frames as f64 / elapsed.as_secs_f64()) as u32;
            self.rate.store(rate, Ordering::Relaxed);
            debug!("refresh rate: {rate} Hz");
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }
}

pub struct ScanDriver<P: OutputPin, D: DelayNs> {
    output: Hub75<P>,
    delay: D,
    buffers: ScanBuffers,
    base_dwell_ns: u32,
    state: ScanState,
    address: usize,
    plane: u8,
    frames: u64,
    stats: RefreshStats,
}

impl<P: OutputPin, D: DelayNs> ScanDriver<P, D> {
    /// Claim the pins and prepare to scan frames from `buffers`.
    ///
    /// Fails if the pins cannot address every row of `geometry` or cannot be
    /// driven to their idle state.
    pub fn new(
        geometry: &PanelGeometry,
        pins: Hub75Pins<P>,
        delay: D,
        buffers: ScanBuffers,
        base_dwell_ns: u32,
    ) -> Result<Self, Hub75Error> {
        if base_dwell_ns == 0 {
            return Err(Hub75Error::InvalidConfig("base dwell must be positive"));
        }
        let output = Hub75::new(pins, geometry.address_lines())?;
        Ok(Self {
            output,
            delay,
            buffers,
            base_dwell_ns,
            state: ScanState::Idle,
            address: 0,
            plane: 0,
            frames: 0,
            stats: RefreshStats::new(Duration::from_secs(1)),
        })
    }

    /// How often the measured refresh rate is updated.
    pub fn set_stats_interval(&mut self, interval: Duration) {
        self.stats.interval = interval;
    }

    /// Frames per second over the last stats interval, shared with other threads.
    pub fn refresh_rate(&self) -> Arc<AtomicU32> {
        self.stats.rate.clone()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Row address being scanned.
    pub fn address(&self) -> usize {
        self.address
    }

    pub fn plane(&self) -> u8 {
        self.plane
    }

    /// Completed frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn current_scan_buffer(&self) -> &BitPlanes {
        self.buffers.current_scan_buffer()
    }

    /// Perform the current state's work and move to the next state.
    pub fn step(&mut self) -> Result<ScanState, Hub75Error> {
        self.state = match self.state {
            ScanState::Idle => {
                self.buffers.swap();
                ScanState::RowSelect
            }
            ScanState::RowSelect => {
                self.output.blank(true)?;
                self.output.set_address(self.address)?;
                ScanState::ShiftData
            }
            ScanState::ShiftData => {
                let row = self
                    .buffers
                    .current_scan_buffer()
                    .row(self.plane, self.address)
                    .unwrap_or_default();
                self.output.shift_row(row)?;
                ScanState::Latch
            }
            ScanState::Latch => {
                self.output.latch()?;
                ScanState::DisplayDwell
            }
            ScanState::DisplayDwell => {
                let dwell = self
                    .base_dwell_ns
                    .saturating_mul(BitPlanes::weight(self.plane));
                self.output.blank(false)?;
                self.delay.delay_ns(dwell);
                self.output.blank(true)?;
                self.advance();
                ScanState::RowSelect
            }
            ScanState::Stopped => ScanState::Stopped,
        };
        Ok(self.state)
    }

    // next plane, then next row, then next frame
    fn advance(&mut self) {
        let current = self.buffers.current_scan_buffer();
        self.plane += 1;
        if self.plane < current.planes() {
            return;
        }
        self.plane = 0;
        self.address += 1;
        if self.address < current.rows() {
            return;
        }
        self.address = 0;
        self.frames += 1;
        self.stats.record_frame();
        self.buffers.swap();
    }

    /// Scan until one more frame has been completed.
    pub fn refresh_frame(&mut self) -> Result<(), Hub75Error> {
        let target = self.frames + 1;
        while self.frames < target {
            if self.step()? == ScanState::Stopped {
                break;
            }
        }
        Ok(())
    }

    /// Scan until `running` is cleared, then stop.
    ///
    /// The flag is checked at every row/plane boundary. A pin failure ends
    /// the loop; the display is still blanked on the way out if possible.
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), Hub75Error> {
        info!(
            "scan loop started, {} rows, {} planes",
            self.current_scan_buffer().rows(),
            self.current_scan_buffer().planes()
        );
        let result = self.scan_while(running);
        if let Err(e) = &result {
            error!("scan loop failed: {e}");
        }
        let stopped = self.stop();
        info!("scan loop stopped after {} frames", self.frames);
        result.and(stopped)
    }

    fn scan_while(&mut self, running: &AtomicBool) -> Result<(), Hub75Error> {
        while running.load(Ordering::Acquire) {
            loop {
                match self.step()? {
                    ScanState::RowSelect | ScanState::Stopped => break,
                    _ => {}
                }
            }
            if self.state == ScanState::Stopped {
                break;
            }
        }
        Ok(())
    }

    /// Shift black into the panel, blank it and enter `Stopped`.
    pub fn stop(&mut self) -> Result<(), Hub75Error> {
        if self.state == ScanState::Stopped {
            return Ok(());
        }
        self.state = ScanState::Stopped;
        let columns = self.buffers.current_scan_buffer().columns();
        self.output.blank(true)?;
        self.output.shift_blank(columns)?;
        self.output.latch()?;
        self.output.blank(true)
    }

    /// Give the pins back.
    pub fn release(self) -> Hub75Pins<P> {
        debug!("releasing hub75 pins");
        self.output.release()
    }
}
