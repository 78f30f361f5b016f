//! # Render Cycles
//!
//! A [`RenderCycle`] is one background thread rendering one page mode: draw a
//! fresh frame, push it, sleep one tick, repeat. Stopping a cycle is a
//! cooperative handshake (raise the shared stop flag, then join) and the
//! thread's return value hands the peripherals back to the caller, so the
//! display can only ever be owned by one live cycle.
//!
//! Cancellation is checked exactly once per iteration, at the top. The flag
//! may be raised mid-iteration, in which case the current frame completes and
//! is pushed whole; the thread then exits before starting another. Worst-case
//! stop latency is therefore one full iteration: the render tick plus the
//! blocking CPU sample.
//!
//! Per-iteration failures split two ways:
//! - a metrics probe error skips this tick's frame and keeps looping
//!   (a flaky temperature read must not kill the panel)
//! - a display error ends the cycle immediately and surfaces through the
//!   join, since the link state is unknown after a transport fault

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::Config;
use crate::display::DisplaySink;
use crate::frame::Frame;
use crate::metrics::MetricsSource;
use crate::pages::{self, NetThroughput};
use crate::pcd8544::DisplayError;
use crate::PageMode;

/// The I/O collaborators a render cycle needs, bundled so they can move
/// through the thread boundary together and come back out at the join.
pub struct Peripherals<S, M, C> {
    pub sink: S,
    pub metrics: M,
    pub clock: C,
}

/// A running render thread plus the handle used to stop it.
pub struct RenderCycle<S, M, C> {
    stop: Arc<AtomicBool>,
    handle: thread::JoinHandle<Result<Peripherals<S, M, C>, DisplayError>>,
}

impl<S, M, C> RenderCycle<S, M, C>
where
    S: DisplaySink + Send + 'static,
    M: MetricsSource + Send + 'static,
    C: Clock + Send + 'static,
{
    /// Spawn the render thread for `mode`, taking ownership of the
    /// peripherals until [`RenderCycle::stop`].
    pub fn start(mode: PageMode, peripherals: Peripherals<S, M, C>, config: &Config) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let config = config.clone();
        let handle = thread::spawn(move || run(mode, peripherals, &config, &flag));
        Self { stop, handle }
    }

    /// True once the thread has exited on its own, which, without a stop
    /// request, means it died on a display error.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Raise the stop flag and block until the thread has fully quiesced
    /// (the rendezvous). Returns the peripherals for the next cycle, or the
    /// display error that killed this one.
    pub fn stop(self) -> Result<Peripherals<S, M, C>, DisplayError> {
        self.stop.store(true, Ordering::SeqCst);
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(DisplayError("render thread panicked".to_string())),
        }
    }
}

/// The render loop body. Runs on the spawned thread until the stop flag is
/// observed at an iteration boundary, then hands the peripherals back.
fn run<S, M, C>(
    mode: PageMode,
    mut peripherals: Peripherals<S, M, C>,
    config: &Config,
    stop: &AtomicBool,
) -> Result<Peripherals<S, M, C>, DisplayError>
where
    S: DisplaySink,
    M: MetricsSource,
    C: Clock,
{
    let tick = Duration::from_millis(config.timing.render_tick_ms);

    // Seed the throughput baseline before the first computation; the first
    // delta then spans at least the CPU sampling window.
    let mut net = NetThroughput::seed(&mut peripherals.metrics, &config.network.interface);

    loop {
        // The only cancellation point: never mid-draw, never mid-push.
        if stop.load(Ordering::SeqCst) {
            return Ok(peripherals);
        }

        let mut frame = Frame::new(peripherals.sink.width(), peripherals.sink.height());
        let drawn = match mode {
            PageMode::SystemInfo => pages::draw_system_info(
                &mut frame,
                &mut peripherals.metrics,
                &mut net,
                config,
            ),
            PageMode::DateTime => {
                pages::draw_date_time(&mut frame, &peripherals.clock);
                Ok(())
            }
        };

        match drawn {
            Ok(()) => {
                peripherals.sink.push_frame(&frame)?;
                peripherals.sink.show()?;
            }
            Err(err) => {
                eprintln!("metrics unavailable, skipping frame: {}", err);
            }
        }

        thread::sleep(tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::metrics::{MetricsError, NetSample};
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    struct CountingSink {
        pushes: Arc<AtomicUsize>,
    }

    impl DisplaySink for CountingSink {
        fn width(&self) -> u32 {
            84
        }

        fn height(&self) -> u32 {
            48
        }

        fn clear(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn push_frame(&mut self, _frame: &Frame) -> Result<(), DisplayError> {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn show(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }
    }

    struct QuietMetrics;

    impl MetricsSource for QuietMetrics {
        fn cpu_percent(&mut self, _window: Duration) -> Result<f32, MetricsError> {
            Ok(1.0)
        }

        fn mem_percent(&mut self) -> Result<f32, MetricsError> {
            Ok(1.0)
        }

        fn cpu_temperature(&mut self) -> Result<f32, MetricsError> {
            Ok(40.0)
        }

        fn network_counters(&mut self, _interface: &str) -> Result<NetSample, MetricsError> {
            Ok(NetSample {
                bytes_sent: 0,
                bytes_recv: 0,
                taken_at: Instant::now(),
            })
        }

        fn wireless_client_count(&mut self) -> Result<u32, MetricsError> {
            Ok(0)
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.timing.render_tick_ms = 5;
        config.timing.cpu_sample_ms = 0;
        config
    }

    #[test]
    fn test_cycle_pushes_then_returns_peripherals() {
        let pushes = Arc::new(AtomicUsize::new(0));
        let peripherals = Peripherals {
            sink: CountingSink {
                pushes: Arc::clone(&pushes),
            },
            metrics: QuietMetrics,
            clock: SystemClock,
        };

        let cycle = RenderCycle::start(PageMode::SystemInfo, peripherals, &test_config());
        while pushes.load(Ordering::SeqCst) < 3 {
            thread::sleep(Duration::from_millis(2));
        }
        let returned = cycle.stop().unwrap();
        assert_eq!(returned.sink.width(), 84);
    }

    #[test]
    fn test_stopped_cycle_stops_pushing() {
        let pushes = Arc::new(AtomicUsize::new(0));
        let peripherals = Peripherals {
            sink: CountingSink {
                pushes: Arc::clone(&pushes),
            },
            metrics: QuietMetrics,
            clock: SystemClock,
        };

        let cycle = RenderCycle::start(PageMode::DateTime, peripherals, &test_config());
        while pushes.load(Ordering::SeqCst) < 1 {
            thread::sleep(Duration::from_millis(2));
        }
        cycle.stop().unwrap();

        let after_join = pushes.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(pushes.load(Ordering::SeqCst), after_join);
    }
}
