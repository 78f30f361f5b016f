//! # Page Draw Routines
//!
//! The two display pages, drawn with `embedded-graphics` mono fonts into any
//! binary-color target (the real [`crate::frame::Frame`] in production, a
//! `MockDisplay` in tests).
//!
//! The SYSTEM_INFO page gathers *all* of its readings before touching the
//! target: if any probe fails the frame is left untouched and the error
//! bubbles up, so a partially-populated page can never reach the panel. Row
//! positions are fixed pixel offsets sized for the 84×48 panel with an
//! 8-pixel line pitch.

use std::time::Duration;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_5X8},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};

use crate::clock::Clock;
use crate::config::Config;
use crate::metrics::{MetricsError, MetricsSource, NetSample};

/// SYSTEM_INFO row baselines (top of each 8px text row).
const ROW_CPU: i32 = 0;
const ROW_RAM: i32 = 8;
const ROW_TEMP: i32 = 16;
const ROW_UPLOAD: i32 = 24;
const ROW_DOWNLOAD: i32 = 32;
const ROW_CLIENTS: i32 = 40;

/// DATE_TIME fixed offsets, preserved from the panel layout this replaces.
const DATE_ORIGIN: Point = Point::new(11, 8);
const TIME_ORIGIN: Point = Point::new(17, 16);
const WEEKDAY_ORIGIN: Point = Point::new(23, 24);

/// Upload/download throughput state: the one previous counter sample kept
/// across render ticks.
///
/// Owned by the render thread and seeded when a cycle starts, before the
/// first throughput computation, so there is always a prior sample and the
/// elapsed interval is at least one CPU sampling window, never zero.
#[derive(Debug, Default)]
pub struct NetThroughput {
    prev: Option<NetSample>,
}

impl NetThroughput {
    pub fn new() -> Self {
        Self { prev: None }
    }

    /// Seed the previous sample from a live reading; best-effort, a failed
    /// probe just leaves the first page's rates at zero.
    pub fn seed<M: MetricsSource + ?Sized>(metrics: &mut M, interface: &str) -> Self {
        Self {
            prev: metrics.network_counters(interface).ok(),
        }
    }

    /// Replace the retained sample with `sample` and return (upload,
    /// download) rates in bytes per second, or `None` when no rate can be
    /// computed (no prior sample, or a non-positive elapsed interval).
    pub fn update(&mut self, sample: NetSample) -> Option<(f64, f64)> {
        let prev = self.prev.replace(sample)?;
        let elapsed = sample.taken_at.duration_since(prev.taken_at).as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }
        let up = sample.bytes_sent.saturating_sub(prev.bytes_sent) as f64 / elapsed;
        let down = sample.bytes_recv.saturating_sub(prev.bytes_recv) as f64 / elapsed;
        Some((up, down))
    }
}

/// Format a byte rate with a binary-prefix unit, e.g. `1000 B/s`, `2.5 KiB/s`.
pub fn format_rate(bytes_per_sec: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KiB/s", "MiB/s", "GiB/s"];
    let mut value = bytes_per_sec.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{:.0} {}", value, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Render the SYSTEM_INFO page.
///
/// Reads every metric first (the CPU sample blocks for its window, which
/// keeps the network delta interval comfortably positive), then draws the six
/// rows. On any probe error the target is left untouched and the caller
/// skips the frame for this tick.
pub fn draw_system_info<D, M>(
    target: &mut D,
    metrics: &mut M,
    net: &mut NetThroughput,
    config: &Config,
) -> Result<(), MetricsError>
where
    D: DrawTarget<Color = BinaryColor>,
    M: MetricsSource + ?Sized,
{
    let cpu = metrics.cpu_percent(Duration::from_millis(config.timing.cpu_sample_ms))?;
    let ram = metrics.mem_percent()?;
    let temp = metrics.cpu_temperature()?;
    let sample = metrics.network_counters(&config.network.interface)?;
    let clients = metrics.wireless_client_count()?;
    let (up, down) = net.update(sample).unwrap_or((0.0, 0.0));

    let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
    let rows = [
        (ROW_CPU, format!("CPU {cpu:.1}%")),
        (ROW_RAM, format!("RAM {ram:.1}%")),
        (ROW_TEMP, format!("CPU TMP {temp:.1}'C")),
        (ROW_UPLOAD, format!("UL:{}", format_rate(up))),
        (ROW_DOWNLOAD, format!("DL:{}", format_rate(down))),
        (ROW_CLIENTS, format!("{clients} WIFI Con.")),
    ];
    for (y, text) in &rows {
        Text::with_baseline(text, Point::new(0, *y), style, Baseline::Top)
            .draw(target)
            .ok();
    }
    Ok(())
}

/// Render the DATE_TIME page: date, time, and the weekday abbreviation at a
/// larger size, each at its fixed offset.
pub fn draw_date_time<D, C>(target: &mut D, clock: &C)
where
    D: DrawTarget<Color = BinaryColor>,
    C: Clock + ?Sized,
{
    let now = clock.now();
    let small = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
    let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);

    Text::with_baseline(
        &now.format("%Y/%m/%d").to_string(),
        DATE_ORIGIN,
        small,
        Baseline::Top,
    )
    .draw(target)
    .ok();
    Text::with_baseline(
        &now.format("%H:%M:%S").to_string(),
        TIME_ORIGIN,
        small,
        Baseline::Top,
    )
    .draw(target)
    .ok();
    Text::with_baseline(
        &now.format("%a").to_string(),
        WEEKDAY_ORIGIN,
        large,
        Baseline::Top,
    )
    .draw(target)
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use chrono::{Local, TimeZone};
    use embedded_graphics::mock_display::MockDisplay;
    use std::time::Instant;

    struct StubMetrics {
        fail_temperature: bool,
    }

    impl StubMetrics {
        fn ok() -> Self {
            Self {
                fail_temperature: false,
            }
        }
    }

    impl MetricsSource for StubMetrics {
        fn cpu_percent(&mut self, _window: Duration) -> Result<f32, MetricsError> {
            Ok(12.3)
        }

        fn mem_percent(&mut self) -> Result<f32, MetricsError> {
            Ok(45.6)
        }

        fn cpu_temperature(&mut self) -> Result<f32, MetricsError> {
            if self.fail_temperature {
                Err(MetricsError::Unavailable("vcgencmd missing".into()))
            } else {
                Ok(48.3)
            }
        }

        fn network_counters(&mut self, _interface: &str) -> Result<NetSample, MetricsError> {
            Ok(NetSample {
                bytes_sent: 1000,
                bytes_recv: 2000,
                taken_at: Instant::now(),
            })
        }

        fn wireless_client_count(&mut self) -> Result<u32, MetricsError> {
            Ok(3)
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> chrono::DateTime<Local> {
            Local.with_ymd_and_hms(2024, 5, 4, 12, 34, 56).unwrap()
        }
    }

    fn sample(sent: u64, recv: u64, at: Instant) -> NetSample {
        NetSample {
            bytes_sent: sent,
            bytes_recv: recv,
            taken_at: at,
        }
    }

    #[test]
    fn test_throughput_from_consecutive_samples() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);

        let mut net = NetThroughput::new();
        assert!(net.update(sample(1000, 500, t0)).is_none());

        let (up, down) = net.update(sample(2000, 1500, t1)).unwrap();
        assert!((up - 1000.0).abs() < 1e-9);
        assert!((down - 1000.0).abs() < 1e-9);
        assert_eq!(format_rate(up), "1000 B/s");
    }

    #[test]
    fn test_throughput_zero_interval_yields_none() {
        let t0 = Instant::now();
        let mut net = NetThroughput::new();
        net.update(sample(1000, 1000, t0));
        assert!(net.update(sample(9000, 9000, t0)).is_none());
    }

    #[test]
    fn test_throughput_counter_reset_does_not_underflow() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let mut net = NetThroughput::new();
        net.update(sample(5000, 5000, t0));
        let (up, down) = net.update(sample(100, 100, t1)).unwrap();
        assert_eq!(up, 0.0);
        assert_eq!(down, 0.0);
    }

    #[test]
    fn test_format_rate_units() {
        assert_eq!(format_rate(0.0), "0 B/s");
        assert_eq!(format_rate(1000.0), "1000 B/s");
        assert_eq!(format_rate(2048.0), "2.0 KiB/s");
        assert_eq!(format_rate(1024.0 * 1024.0 * 3.5), "3.5 MiB/s");
        assert_eq!(format_rate(-5.0), "0 B/s");
    }

    #[test]
    fn test_system_info_page_fills_all_rows() {
        let mut frame = Frame::new(84, 48);
        let mut net = NetThroughput::new();
        draw_system_info(
            &mut frame,
            &mut StubMetrics::ok(),
            &mut net,
            &Config::default(),
        )
        .unwrap();

        for top in [0u32, 8, 16, 24, 32, 40] {
            let lit: u32 = (top..top + 8).map(|y| frame.lit_in_row(y)).sum();
            assert!(lit > 0, "row band at y={top} is empty");
        }
    }

    #[test]
    fn test_system_info_failure_leaves_frame_blank() {
        let mut frame = Frame::new(84, 48);
        let mut net = NetThroughput::new();
        let mut metrics = StubMetrics {
            fail_temperature: true,
        };
        let result = draw_system_info(&mut frame, &mut metrics, &mut net, &Config::default());

        assert!(matches!(result, Err(MetricsError::Unavailable(_))));
        for y in 0..48 {
            assert_eq!(frame.lit_in_row(y), 0);
        }
    }

    #[test]
    fn test_date_time_page_layout() {
        let mut frame = Frame::new(84, 48);
        draw_date_time(&mut frame, &FixedClock);

        // Nothing above the date row
        for y in 0..8 {
            assert_eq!(frame.lit_in_row(y), 0);
        }
        // Date, time, and the large weekday are present
        let date_band: u32 = (8..16).map(|y| frame.lit_in_row(y)).sum();
        let time_band: u32 = (16..24).map(|y| frame.lit_in_row(y)).sum();
        let weekday_band: u32 = (24..44).map(|y| frame.lit_in_row(y)).sum();
        assert!(date_band > 0);
        assert!(time_band > 0);
        assert!(weekday_band > 0);
    }

    #[test]
    fn test_pages_draw_on_mock_display() {
        let mut display = MockDisplay::<BinaryColor>::new();
        display.set_allow_out_of_bounds_drawing(true);
        display.set_allow_overdraw(true);
        draw_date_time(&mut display, &FixedClock);

        // Check that some pixels were drawn
        let pixels_drawn = display
            .bounding_box()
            .points()
            .filter(|&p| display.get_pixel(p).is_some())
            .count();
        assert!(pixels_drawn > 0, "No pixels were drawn to the display");
    }
}
