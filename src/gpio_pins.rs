//! GPIO line adapters backed by the kernel character device (gpio-cdev).

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use sysinfo_display_lib::button::{InputError, InputSource, Level};
use sysinfo_display_lib::pcd8544::{DisplayError, GpioPin};

/// An output line for the display's DC/RST control pins.
pub struct CdevOutputPin {
    line: LineHandle,
}

impl CdevOutputPin {
    pub fn new(chip: &mut Chip, offset: u32) -> Result<Self, DisplayError> {
        let line = chip
            .get_line(offset)
            .map_err(|e| DisplayError(e.to_string()))?
            .request(LineRequestFlags::OUTPUT, 0, "sysinfo-display")
            .map_err(|e| DisplayError(e.to_string()))?;
        Ok(Self { line })
    }
}

impl GpioPin for CdevOutputPin {
    fn set_high(&mut self) -> Result<(), DisplayError> {
        self.line.set_value(1).map_err(|e| DisplayError(e.to_string()))
    }

    fn set_low(&mut self) -> Result<(), DisplayError> {
        self.line.set_value(0).map_err(|e| DisplayError(e.to_string()))
    }
}

/// The page-toggle button line. Pull-up wiring: a raw 0 reads as pressed.
pub struct CdevButton {
    line: LineHandle,
}

impl CdevButton {
    pub fn new(chip: &mut Chip, offset: u32) -> Result<Self, InputError> {
        let line = chip
            .get_line(offset)
            .map_err(|e| InputError(e.to_string()))?
            .request(LineRequestFlags::INPUT, 0, "sysinfo-display")
            .map_err(|e| InputError(e.to_string()))?;
        Ok(Self { line })
    }
}

impl InputSource for CdevButton {
    fn read_level(&mut self) -> Result<Level, InputError> {
        let value = self
            .line
            .get_value()
            .map_err(|e| InputError(e.to_string()))?;
        Ok(if value == 0 { Level::Low } else { Level::High })
    }
}
