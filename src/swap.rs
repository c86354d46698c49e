//! Double buffered hand-over of encoded frames to the scan thread.
//!
//! The writer encodes every finished frame into its own [`BitPlanes`] and
//! signals it; the scan side takes the newest signaled set at a frame
//! boundary and returns the one it was showing for reuse. Both hand-overs are
//! [`Signal`]s, so neither side ever waits on the other and a set is never
//! modified while it is being scanned.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::trace;

use crate::framebuffer::bitplane::BitPlaneEncoder;
use crate::framebuffer::bitplane::BitPlanes;
use crate::Color;
use crate::FrameBuffer;
use crate::Hub75Error;
use crate::PanelGeometry;

type FrameExchange = Signal<CriticalSectionRawMutex, Box<BitPlanes>>;

struct Exchange {
    published: FrameExchange,
    recycled: FrameExchange,
}

/// Create the writer and scan halves of a frame exchange.
///
/// The scan side starts out showing a black frame.
pub fn channel(geometry: PanelGeometry, encoder: BitPlaneEncoder) -> (FramePublisher, ScanBuffers) {
    let exchange = Arc::new(Exchange {
        published: Signal::new(),
        recycled: Signal::new(),
    });
    let current = Box::new(BitPlanes::new(&geometry, encoder.bits()));
    (
        FramePublisher {
            exchange: exchange.clone(),
            geometry,
            staged: BitPlanes::new(&geometry, encoder.bits()),
            encoder,
            generation: 0,
            allocated: 0,
        },
        ScanBuffers {
            exchange,
            current,
            swaps: 0,
        },
    )
}

/// Writer half: encodes and publishes frames.
///
/// The publisher keeps an encoded copy of the writer's frame. Single pixel
/// changes patch that copy in place and publishing only copies it into a
/// scan buffer.
pub struct FramePublisher {
    exchange: Arc<Exchange>,
    geometry: PanelGeometry,
    encoder: BitPlaneEncoder,
    staged: BitPlanes,
    generation: u64,
    allocated: usize,
}

impl FramePublisher {
    /// Encode `fb` and make it the next frame to scan.
    ///
    /// A frame published before the scan side picked up the previous one
    /// replaces it. Returns the generation stamped on the new frame.
    pub fn publish(&mut self, fb: &FrameBuffer) -> u64 {
        self.stage(fb);
        self.flush()
    }

    /// Re-encode all of `fb` into the staged frame.
    pub fn stage(&mut self, fb: &FrameBuffer) {
        self.encoder.encode(fb, &self.geometry, &mut self.staged);
    }

    /// Change one pixel of the staged frame.
    pub fn stage_pixel(&mut self, x: usize, y: usize, color: Color) -> Result<(), Hub75Error> {
        self.encoder
            .encode_pixel(&self.geometry, &mut self.staged, x, y, color)
    }

    /// Replace the staged frame with a single color.
    pub fn stage_fill(&mut self, color: Color) {
        self.encoder
            .encode_fill(&self.geometry, &mut self.staged, color);
    }

    /// Publish the staged frame.
    pub fn flush(&mut self) -> u64 {
        // an unconsumed frame is stale, write over it
        let mut planes = match self.exchange.published.try_take() {
            Some(planes) => planes,
            None => match self.exchange.recycled.try_take() {
                Some(planes) => planes,
                None => {
                    self.allocated += 1;
                    trace!("allocating scan buffer {}", self.allocated);
                    Box::new(BitPlanes::new(&self.geometry, self.encoder.bits()))
                }
            },
        };
        planes.copy_from(&self.staged);
        self.generation += 1;
        planes.set_generation(self.generation);
        self.exchange.published.signal(planes);
        self.generation
    }

    /// Change the modulation depth and re-stage `fb` at the new depth.
    pub fn set_pwm_bits(&mut self, bits: u8, fb: &FrameBuffer) -> Result<(), Hub75Error> {
        self.encoder = BitPlaneEncoder::new(bits)?;
        self.stage(fb);
        Ok(())
    }

    pub fn pwm_bits(&self) -> u8 {
        self.encoder.bits()
    }

    /// Generation of the last published frame.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Scan buffers this publisher had to allocate.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn staged(&self) -> &BitPlanes {
        &self.staged
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }
}

/// Scan half: owns the frame currently being displayed.
pub struct ScanBuffers {
    exchange: Arc<Exchange>,
    current: Box<BitPlanes>,
    swaps: u64,
}

impl ScanBuffers {
    pub fn current_scan_buffer(&self) -> &BitPlanes {
        &self.current
    }

    /// Switch to the newest published frame, if there is one.
    ///
    /// Only call this between frames.
    pub fn swap(&mut self) -> bool {
        let Some(next) = self.exchange.published.try_take() else {
            return false;
        };
        let previous = core::mem::replace(&mut self.current, next);
        trace!(
            "swapped frame {} for {}",
            previous.generation(),
            self.current.generation()
        );
        self.exchange.recycled.signal(previous);
        self.swaps += 1;
        true
    }

    /// Frames swapped in so far.
    pub fn swaps(&self) -> u64 {
        self.swaps
    }
}
