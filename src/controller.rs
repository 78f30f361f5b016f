//! # Mode Controller
//!
//! Owns the lifecycle of render cycles. After the one-time startup sequence
//! (clear the panel, show the splash for its configured duration), the
//! controller launches the first cycle in SYSTEM_INFO mode and settles into
//! its polling loop: sample the button level, and on each press edge stop the
//! active cycle, wait for it to fully quiesce, flip the page mode, and start
//! a fresh cycle.
//!
//! The stop-then-start rendezvous is what guarantees at most one cycle ever
//! holds the display; the cost is a pause of at most one render iteration on
//! every mode switch, which is imperceptible on a status panel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::button::{EdgeDetector, InputError, InputSource};
use crate::clock::Clock;
use crate::config::Config;
use crate::display::DisplaySink;
use crate::frame::Frame;
use crate::metrics::MetricsSource;
use crate::pcd8544::DisplayError;
use crate::render_loop::{Peripherals, RenderCycle};
use crate::splash::{self, SplashError};
use crate::PageMode;

/// Fatal controller failures. Metrics problems never reach this level; these
/// are the wiring-and-transport faults the process cannot outlive.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Splash(#[from] SplashError),
}

/// Drives the whole panel: startup sequence, then button-driven page flips.
pub struct ModeController<S, M, C, I> {
    peripherals: Peripherals<S, M, C>,
    input: I,
    config: Config,
}

impl<S, M, C, I> ModeController<S, M, C, I>
where
    S: DisplaySink + Send + 'static,
    M: MetricsSource + Send + 'static,
    C: Clock + Send + 'static,
    I: InputSource,
{
    pub fn new(peripherals: Peripherals<S, M, C>, input: I, config: Config) -> Self {
        Self {
            peripherals,
            input,
            config,
        }
    }

    /// Run until `shutdown` is raised (a signal only tests use in practice;
    /// in production the process runs until killed) or a fatal error occurs.
    pub fn run(self, shutdown: &AtomicBool) -> Result<(), ControllerError> {
        let Self {
            mut peripherals,
            mut input,
            config,
        } = self;

        let poll = Duration::from_millis(config.timing.button_poll_ms);

        // Startup sequence, strictly before any cycle exists: blank panel,
        // splash image, fixed dwell.
        peripherals.sink.clear()?;
        if !config.display.splash_image.is_empty() {
            let logo = splash::load(
                &config.display.splash_image,
                peripherals.sink.width(),
                peripherals.sink.height(),
            )?;
            let mut frame = Frame::new(peripherals.sink.width(), peripherals.sink.height());
            splash::draw(&mut frame, &logo, peripherals.sink.width());
            peripherals.sink.push_frame(&frame)?;
            peripherals.sink.show()?;
            thread::sleep(Duration::from_millis(config.timing.splash_ms));
        }

        let mut mode = PageMode::SystemInfo;
        let mut cycle = RenderCycle::start(mode, peripherals, &config);
        let mut edges = EdgeDetector::new();

        loop {
            if shutdown.load(Ordering::SeqCst) {
                cycle.stop()?;
                return Ok(());
            }

            // A cycle only exits unprompted when the display failed.
            if cycle.is_finished() {
                cycle.stop()?;
                return Ok(());
            }

            let level = match input.read_level() {
                Ok(level) => level,
                Err(err) => {
                    // Best effort: quiesce the render thread before dying.
                    let _ = cycle.stop();
                    return Err(err.into());
                }
            };

            if edges.falling_edge(level) {
                let peripherals = cycle.stop()?;
                mode = mode.flipped();
                cycle = RenderCycle::start(mode, peripherals, &config);
            }

            thread::sleep(poll);
        }
    }
}
