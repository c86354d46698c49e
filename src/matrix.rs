use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_graphics::pixelcolor::RgbColor;
use log::info;
use log::warn;

use crate::framebuffer::bitplane::BitPlaneEncoder;
use crate::gpio::Hub75Pins;
use crate::scan::ScanDriver;
use crate::swap;
use crate::swap::FramePublisher;
use crate::Color;
use crate::FrameBuffer;
use crate::Hub75Error;
use crate::MatrixConfig;
use crate::PanelGeometry;

type ScanResult<P> = Result<Hub75Pins<P>, Hub75Error>;

/// A running LED matrix.
///
/// Owns the writer side frame and a dedicated scan thread that keeps the
/// panel refreshed. Every mutating call publishes the frame before it
/// returns, and the scan thread shows it from its next frame on.
pub struct RgbMatrix<P: OutputPin + Send + 'static> {
    geometry: PanelGeometry,
    canvas: FrameBuffer,
    publisher: FramePublisher,
    running: Arc<AtomicBool>,
    refresh_rate: Arc<AtomicU32>,
    scan: Option<JoinHandle<ScanResult<P>>>,
}

impl<P: OutputPin + Send + 'static> RgbMatrix<P> {
    /// Claim `pins` and start refreshing a black display.
    ///
    /// Configuration and pin errors are reported here, before the scan
    /// thread exists.
    pub fn start<D>(
        geometry: PanelGeometry,
        pins: Hub75Pins<P>,
        delay: D,
        config: MatrixConfig,
    ) -> Result<Self, Hub75Error>
    where
        D: DelayNs + Send + 'static,
    {
        config.validate()?;
        let encoder = BitPlaneEncoder::new(config.pwm_bits)?;
        let (publisher, buffers) = swap::channel(geometry, encoder);
        let mut driver = ScanDriver::new(&geometry, pins, delay, buffers, config.base_dwell_ns)?;
        driver.set_stats_interval(config.stats_interval);
        let refresh_rate = driver.refresh_rate();

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let scan = thread::Builder::new()
            .name("hub75-scan".into())
            .spawn(move || -> ScanResult<P> {
                driver.run(&flag)?;
                Ok(driver.release())
            })
            .map_err(Hub75Error::Spawn)?;

        info!(
            "hub75 matrix {}x{} started, {} pwm bits, {} ns on-time per frame",
            geometry.width(),
            geometry.height(),
            config.pwm_bits,
            config.frame_dwell_ns(&geometry)
        );

        Ok(Self {
            geometry,
            canvas: FrameBuffer::with_order(&geometry, config.color_order),
            publisher,
            running,
            refresh_rate,
            scan: Some(scan),
        })
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    pub fn width(&self) -> usize {
        self.geometry.width()
    }

    pub fn height(&self) -> usize {
        self.geometry.height()
    }

    pub fn clear(&mut self) {
        self.fill_color(Color::BLACK);
    }

    /// Fill with a packed `0xRRGGBB` color.
    pub fn fill(&mut self, packed: u32) {
        self.fill_color(self.canvas.color_order().unpack(packed));
    }

    pub fn fill_rgb(&mut self, red: u8, green: u8, blue: u8) {
        self.fill_color(Color::new(red, green, blue));
    }

    /// Set one pixel; only that pixel is re-encoded.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) -> Result<(), Hub75Error> {
        self.canvas.set_pixel(x, y, color)?;
        self.publisher.stage_pixel(x, y, color)?;
        self.publisher.flush();
        Ok(())
    }

    pub fn set_pixel_rgb(
        &mut self,
        x: usize,
        y: usize,
        red: u8,
        green: u8,
        blue: u8,
    ) -> Result<(), Hub75Error> {
        self.set_pixel(x, y, Color::new(red, green, blue))
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Color> {
        self.canvas.get_pixel(x, y)
    }

    /// Replace the whole frame, three bytes per pixel, row-major.
    pub fn set_buffer(&mut self, bytes: &[u8]) -> Result<(), Hub75Error> {
        self.canvas.set_buffer(bytes)?;
        self.publish();
        Ok(())
    }

    /// Apply several changes and publish them as a single frame.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut FrameBuffer) -> R) -> R {
        let result = f(&mut self.canvas);
        self.publish();
        result
    }

    /// Change the modulation depth; the current frame is re-encoded.
    pub fn set_pwm_bits(&mut self, bits: u8) -> Result<(), Hub75Error> {
        self.publisher.set_pwm_bits(bits, &self.canvas)?;
        self.publisher.flush();
        Ok(())
    }

    pub fn pwm_bits(&self) -> u8 {
        self.publisher.pwm_bits()
    }

    /// Generation of the last published frame.
    pub fn generation(&self) -> u64 {
        self.publisher.generation()
    }

    /// Frames per second measured by the scan thread.
    pub fn refresh_rate(&self) -> u32 {
        self.refresh_rate.load(Ordering::Relaxed)
    }

    /// Whether the scan thread is still refreshing the panel.
    pub fn is_running(&self) -> bool {
        self.scan.as_ref().is_some_and(|scan| !scan.is_finished())
    }

    /// Stop refreshing, blank the panel and hand the pins back.
    ///
    /// Returns the error that ended the scan loop if it failed on its own.
    pub fn stop(mut self) -> Result<Hub75Pins<P>, Hub75Error> {
        self.shutdown().unwrap_or(Err(Hub75Error::ScanThreadPanicked))
    }

    fn publish(&mut self) {
        self.publisher.publish(&self.canvas);
    }

    fn fill_color(&mut self, color: Color) {
        self.canvas.fill(color);
        self.publisher.stage_fill(color);
        self.publisher.flush();
    }

    fn shutdown(&mut self) -> Option<ScanResult<P>> {
        let scan = self.scan.take()?;
        self.running.store(false, Ordering::Release);
        let result = scan.join().unwrap_or(Err(Hub75Error::ScanThreadPanicked));
        info!("hub75 matrix stopped");
        Some(result)
    }
}

impl<P: OutputPin + Send + 'static> Drop for RgbMatrix<P> {
    fn drop(&mut self) {
        if let Some(Err(e)) = self.shutdown() {
            warn!("scan thread ended with error: {e}");
        }
    }
}
