//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! display-config.toml file. It centralizes display geometry, GPIO pin
//! assignments, the empirically chosen loop intervals, and the network
//! probe settings so deployments can tune responsiveness against CPU and
//! metrics-query overhead without recompiling.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration loaded from display-config.toml
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Display geometry, panel tuning, and wiring
    pub display: DisplayConfig,
    /// Loop intervals for the render/poll/splash phases
    pub timing: TimingConfig,
    /// Network throughput and wireless client probes
    pub network: NetworkConfig,
}

/// Display and wiring configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Panel width in pixels
    pub width: u32,
    /// Panel height in pixels
    pub height: u32,
    /// PCD8544 operating voltage (contrast), 0-127
    pub contrast: u8,
    /// PCD8544 bias level, 0-7 (4 suits the 5110 panel)
    pub bias: u8,
    /// Raw 1bpp splash image shown at boot; empty string disables the splash
    pub splash_image: String,
    /// GPIO / SPI wiring
    pub hardware: HardwareConfig,
}

/// GPIO pin assignments (BCM numbering) and the SPI device node
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HardwareConfig {
    /// Data/command select pin
    pub dc_pin: u32,
    /// Reset pin
    pub rst_pin: u32,
    /// Page-toggle button pin (pull-up wiring, low = pressed)
    pub button_pin: u32,
    /// Kernel SPI device (chip select handled by the kernel driver)
    pub spidev: String,
}

/// Loop intervals, in milliseconds.
///
/// These were chosen empirically: the render tick balances refresh rate
/// against the cost of the blocking CPU sample, and the button poll is fast
/// enough that a short press never falls between two polls.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Pause between render iterations
    pub render_tick_ms: u64,
    /// Pause between button level samples
    pub button_poll_ms: u64,
    /// How long the boot splash stays on screen
    pub splash_ms: u64,
    /// CPU utilisation sampling window (dominates per-iteration latency)
    pub cpu_sample_ms: u64,
}

/// Network probe configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Interface whose byte counters feed the UL/DL rows
    pub interface: String,
    /// Script printing the number of associated wireless clients
    pub client_count_script: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            display: DisplayConfig {
                width: 84,  // PCD8544 / Nokia 5110
                height: 48, // PCD8544 / Nokia 5110
                contrast: 52,
                bias: 4,
                splash_image: String::new(),
                hardware: HardwareConfig {
                    dc_pin: 27,
                    rst_pin: 23,
                    button_pin: 21,
                    spidev: "/dev/spidev0.0".to_string(),
                },
            },
            timing: TimingConfig {
                render_tick_ms: 250,
                button_poll_ms: 100,
                splash_ms: 3000,
                cpu_sample_ms: 1000,
            },
            network: NetworkConfig {
                interface: "eth0".to_string(),
                client_count_script: "/etc/sysinfo-display/wifi-clients.sh".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from the display-config.toml file.
    /// Falls back to default configuration if the file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::load_from_path("display-config.toml")
    }

    /// Load configuration from the specified path.
    /// Falls back to default configuration if the file doesn't exist or is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Invalid config file format: {}", e);
                    eprintln!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                eprintln!("Info: No config file found, using default configuration");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.display.width, 84);
        assert_eq!(config.display.height, 48);
        assert_eq!(config.display.contrast, 52);
        assert_eq!(config.timing.render_tick_ms, 250);
        assert_eq!(config.timing.button_poll_ms, 100);
        assert_eq!(config.timing.splash_ms, 3000);
        assert_eq!(config.network.interface, "eth0");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.display.hardware.dc_pin, parsed.display.hardware.dc_pin);
        assert_eq!(config.timing.cpu_sample_ms, parsed.timing.cpu_sample_ms);
        assert_eq!(config.network.interface, parsed.network.interface);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.display.width, 84);
    }

    #[test]
    fn test_load_partial_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Missing sections are a format error, not a crash
        write!(file, "[display]\nwidth = 84\n").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.timing.render_tick_ms, 250);
    }
}
