mod common;

use std::thread;
use std::time::Duration;
use std::time::Instant;

use common::Harness;
use common::NoDelay;
use embedded_graphics::pixelcolor::RgbColor;
use hub75_matrix::Color;
use hub75_matrix::ColorOrder;
use hub75_matrix::Hub75Error;
use hub75_matrix::MatrixConfig;
use hub75_matrix::PanelGeometry;
use hub75_matrix::RgbMatrix;

fn start(harness: &Harness, geometry: PanelGeometry) -> RgbMatrix<common::TestPin> {
    RgbMatrix::start(
        geometry,
        harness.pins(geometry.address_lines()),
        NoDelay,
        MatrixConfig::default(),
    )
    .unwrap()
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn test_fill_primaries() {
    let harness = Harness::default();
    let mut matrix = start(&harness, PanelGeometry::new(32, 2).unwrap());
    assert_eq!(matrix.width(), 64);
    assert_eq!(matrix.height(), 64);

    matrix.fill(0xFF0000);
    assert_eq!(matrix.get_pixel(0, 0), Some(Color::new(255, 0, 0)));
    matrix.fill(0x00FF00);
    assert_eq!(matrix.get_pixel(0, 0), Some(Color::new(0, 255, 0)));
    matrix.fill(0x0000FF);
    assert_eq!(matrix.get_pixel(63, 63), Some(Color::new(0, 0, 255)));

    matrix.clear();
    assert_eq!(matrix.get_pixel(10, 10), Some(Color::BLACK));
    matrix.stop().unwrap();
}

#[test]
fn test_set_pixel() {
    let harness = Harness::default();
    let mut matrix = start(&harness, PanelGeometry::new(16, 1).unwrap());

    matrix.set_pixel_rgb(3, 4, 10, 20, 30).unwrap();
    assert_eq!(matrix.get_pixel(3, 4), Some(Color::new(10, 20, 30)));

    let err = matrix.set_pixel(32, 0, Color::WHITE).unwrap_err();
    assert!(matches!(err, Hub75Error::OutOfRange { x: 32, y: 0, .. }));
    assert!(matrix.set_pixel_rgb(0, 32, 1, 1, 1).is_err());
    assert_eq!(matrix.get_pixel(3, 4), Some(Color::new(10, 20, 30)));
    matrix.stop().unwrap();
}

#[test]
fn test_each_write_publishes_one_frame() {
    let harness = Harness::default();
    let mut matrix = start(&harness, PanelGeometry::new(32, 2).unwrap());
    let first = matrix.generation();

    for x in 0..64 {
        matrix.set_pixel_rgb(x, 63 - x, 255, 255, 255).unwrap();
    }
    assert_eq!(matrix.generation(), first + 64);
    assert!(matrix.set_pixel_rgb(64, 0, 1, 2, 3).is_err());
    assert_eq!(matrix.generation(), first + 64);

    matrix.clear();
    matrix.fill_rgb(1, 2, 3);
    assert_eq!(matrix.generation(), first + 66);
    assert_eq!(matrix.get_pixel(0, 63), Some(Color::new(1, 2, 3)));
    matrix.stop().unwrap();
}

#[test]
fn test_set_buffer() {
    let harness = Harness::default();
    let geometry = PanelGeometry::new(8, 2).unwrap();
    let mut matrix = start(&harness, geometry);

    let bytes: Vec<u8> = (0..geometry.pixel_count() * 3)
        .map(|i| (i % 251) as u8)
        .collect();
    matrix.set_buffer(&bytes).unwrap();
    assert_eq!(matrix.get_pixel(0, 0), Some(Color::new(0, 1, 2)));
    assert_eq!(matrix.get_pixel(1, 0), Some(Color::new(3, 4, 5)));

    let err = matrix.set_buffer(&bytes[1..]).unwrap_err();
    assert!(matches!(err, Hub75Error::SizeMismatch { .. }));
    assert_eq!(matrix.get_pixel(1, 0), Some(Color::new(3, 4, 5)));
    matrix.stop().unwrap();
}

#[test]
fn test_color_order() {
    let harness = Harness::default();
    let geometry = PanelGeometry::new(4, 1).unwrap();
    let mut matrix = RgbMatrix::start(
        geometry,
        harness.pins(geometry.address_lines()),
        NoDelay,
        MatrixConfig::default().with_color_order(ColorOrder::Bgr),
    )
    .unwrap();
    matrix.fill(0xFF0000);
    assert_eq!(matrix.get_pixel(0, 0), Some(Color::BLUE));
    matrix.stop().unwrap();
}

#[test]
fn test_update_batches_changes() {
    let harness = Harness::default();
    let mut matrix = start(&harness, PanelGeometry::new(16, 1).unwrap());
    let drawn = matrix.update(|fb| {
        let mut drawn = 0;
        for x in 0..fb.width() {
            fb.set_pixel(x, x % fb.height(), Color::RED).unwrap();
            drawn += 1;
        }
        drawn
    });
    assert_eq!(drawn, 32);
    assert_eq!(matrix.get_pixel(31, 31), Some(Color::RED));
    matrix.stop().unwrap();
}

#[test]
fn test_pwm_bits() {
    let harness = Harness::default();
    let mut matrix = start(&harness, PanelGeometry::new(8, 1).unwrap());
    assert_eq!(matrix.pwm_bits(), 8);
    assert!(matches!(
        matrix.set_pwm_bits(12),
        Err(Hub75Error::InvalidConfig(_))
    ));
    matrix.set_pwm_bits(11).unwrap();
    assert_eq!(matrix.pwm_bits(), 11);
    matrix.stop().unwrap();
}

#[test]
fn test_refresh_loop_runs() {
    let harness = Harness::default();
    let geometry = PanelGeometry::new(4, 1).unwrap();
    let matrix = RgbMatrix::start(
        geometry,
        harness.pins(geometry.address_lines()),
        NoDelay,
        MatrixConfig::default().with_stats_interval(Duration::from_millis(10)),
    )
    .unwrap();
    assert!(matrix.is_running());
    assert!(wait_for(|| matrix.refresh_rate() > 0));
    assert!(harness.writes() > 0);
    matrix.stop().unwrap();
}

#[test]
fn test_stop_returns_pins() {
    let harness = Harness::default();
    let matrix = start(&harness, PanelGeometry::new(32, 1).unwrap());
    let pins = matrix.stop().unwrap();
    assert_eq!(pins.addr.len(), 5);
    assert_eq!(harness.dropped(), 0);
    drop(pins);
    assert_eq!(harness.dropped(), 14);
}

#[test]
fn test_drop_releases_pins() {
    let harness = Harness::default();
    let matrix = start(&harness, PanelGeometry::new(8, 1).unwrap());
    drop(matrix);
    assert_eq!(harness.dropped(), 12);
}

#[test]
fn test_missing_address_line_fails_at_start() {
    let harness = Harness::default();
    let geometry = PanelGeometry::new(32, 1).unwrap();
    let result = RgbMatrix::start(geometry, harness.pins(4), NoDelay, MatrixConfig::default());
    assert!(matches!(
        result,
        Err(Hub75Error::MissingAddressLine {
            needed: 5,
            supplied: 4
        })
    ));
}

#[test]
fn test_invalid_config_fails_at_start() {
    let harness = Harness::default();
    let geometry = PanelGeometry::new(8, 1).unwrap();
    let result = RgbMatrix::start(
        geometry,
        harness.pins(3),
        NoDelay,
        MatrixConfig::default().with_pwm_bits(0),
    );
    assert!(matches!(result, Err(Hub75Error::InvalidConfig(_))));
}

#[test]
fn test_gpio_failure_stops_refresh() {
    let harness = Harness::default();
    let mut matrix = start(&harness, PanelGeometry::new(8, 1).unwrap());
    harness.fail();
    assert!(wait_for(|| !matrix.is_running()));

    // writes keep working on the frame, they are just not shown any more
    matrix.fill(0x123456);
    assert!(matches!(matrix.stop(), Err(Hub75Error::Gpio(_))));
    assert_eq!(harness.dropped(), 12);
}
