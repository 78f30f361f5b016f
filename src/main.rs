//! # Sysinfo Display Application Entry Point
//!
//! This binary wires the real peripherals to the library's mode controller.
//! It supports both production mode (PCD8544 LCD over SPI + GPIO button) and
//! development mode (`--stdout`, ASCII frames in the terminal with the button
//! unwired).

// Test modules
#[cfg(test)]
mod tests;

#[cfg(all(target_os = "linux", feature = "hardware"))]
mod gpio_pins;
#[cfg(all(target_os = "linux", feature = "hardware"))]
mod spi_bus;

use std::env;
use std::sync::atomic::AtomicBool;

use sysinfo_display_lib::{
    button::Unwired, clock::SystemClock, config::Config, controller::ModeController,
    display::TerminalDisplay, metrics::SystemMetrics, render_loop::Peripherals,
};

/// Initialize the LCD, button, and metrics probes and run the controller
/// until the process is terminated.
#[cfg(all(target_os = "linux", feature = "hardware"))]
fn run_hardware(config: Config, shutdown: &AtomicBool) -> anyhow::Result<()> {
    use anyhow::Context;
    use sysinfo_display_lib::display::Pcd8544Display;

    use crate::gpio_pins::{CdevButton, CdevOutputPin};
    use crate::spi_bus::SpidevBus;

    let hw = config.display.hardware.clone();

    eprintln!("🔧 Initializing PCD8544 panel on {}", hw.spidev);
    eprintln!(
        "   DC: GPIO {}, RST: GPIO {}, button: GPIO {}",
        hw.dc_pin, hw.rst_pin, hw.button_pin
    );

    let mut chip = gpio_cdev::Chip::new("/dev/gpiochip0").context("open gpiochip0")?;
    let dc = CdevOutputPin::new(&mut chip, hw.dc_pin)?;
    let rst = CdevOutputPin::new(&mut chip, hw.rst_pin)?;
    let button = CdevButton::new(&mut chip, hw.button_pin)?;
    let spi = SpidevBus::new(&hw.spidev)?;

    let sink = Pcd8544Display::new(spi, dc, rst, config.display.contrast, config.display.bias)
        .context("initialize display")?;
    eprintln!("✅ Display initialized");

    let peripherals = Peripherals {
        sink,
        metrics: SystemMetrics::new(&config),
        clock: SystemClock,
    };
    ModeController::new(peripherals, button, config).run(shutdown)?;
    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    // Development mode: render ASCII frames to stdout, no hardware required
    let development_mode = env::args().any(|arg| arg == "--stdout");

    let config = Config::load();

    // Runs until the process is terminated by a signal; the flag exists so
    // the controller loop is stoppable under test.
    let shutdown = AtomicBool::new(false);

    if development_mode {
        let peripherals = Peripherals {
            sink: TerminalDisplay::new(config.display.width, config.display.height),
            metrics: SystemMetrics::new(&config),
            clock: SystemClock,
        };
        ModeController::new(peripherals, Unwired, config).run(&shutdown)?;
        return Ok(());
    }

    #[cfg(all(target_os = "linux", feature = "hardware"))]
    {
        run_hardware(config, &shutdown)?;
    }

    #[cfg(all(target_os = "linux", not(feature = "hardware")))]
    {
        eprintln!("Hardware support not enabled. Rebuild with --features hardware, or use --stdout for development mode.");
    }

    #[cfg(not(target_os = "linux"))]
    {
        eprintln!("Hardware mode is only available on Linux. Use --stdout for development mode.");
        return Err(anyhow::anyhow!(
            "Hardware mode not supported on this platform"
        ));
    }

    #[allow(unreachable_code)]
    Ok(())
}
