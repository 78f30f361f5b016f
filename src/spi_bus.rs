//! SPI bus adapter backed by the kernel spidev driver (CS handled by the
//! kernel).

use spidev::{SpiModeFlags, Spidev, SpidevOptions};
use std::io::Write;
use sysinfo_display_lib::pcd8544::{DisplayError, SpiWrite};

pub struct SpidevBus {
    dev: Spidev,
}

impl SpidevBus {
    pub fn new(path: &str) -> Result<Self, DisplayError> {
        let mut dev = Spidev::open(path).map_err(|e| DisplayError(e.to_string()))?;

        let opts = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(4_000_000) // PCD8544 tops out at 4 MHz
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&opts).map_err(|e| DisplayError(e.to_string()))?;
        Ok(Self { dev })
    }
}

impl SpiWrite for SpidevBus {
    fn write(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        self.dev
            .write_all(data)
            .map_err(|e| DisplayError(e.to_string()))
    }
}
