//! PCD8544 LCD Controller Driver
//!
//! Drives the 84×48 monochrome controller behind Nokia 5110/3310 panels over
//! SPI. The chip select is left to the kernel SPI driver; the driver only
//! owns the data/command and reset lines, exposed as traits so the driver is
//! testable against recorded pin and bus doubles.
//!
//! The panel's framebuffer is bank-major: six horizontal banks of eight pixel
//! rows, one byte per column, LSB at the top of the bank. Callers hand in a
//! buffer already packed that way (see `Frame::to_vertical_banks`).

use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Display dimensions fixed by the controller
pub const LCD_WIDTH: u32 = 84;
pub const LCD_HEIGHT: u32 = 48;

/// Framebuffer size: 84 columns × 6 banks
pub const LCD_BYTES: usize = (LCD_WIDTH * LCD_HEIGHT / 8) as usize;

// Command set (PCD8544 datasheet)
const FUNCTION_SET: u8 = 0x20;
const EXTENDED_INSTRUCTION: u8 = 0x01;
const SET_BIAS: u8 = 0x10;
const SET_VOP: u8 = 0x80;
const DISPLAY_CONTROL: u8 = 0x08;
const DISPLAY_NORMAL: u8 = 0x04;
const SET_Y_ADDR: u8 = 0x40;
const SET_X_ADDR: u8 = 0x80;

/// SPI or GPIO transport fault. Fatal: after a transport error the physical
/// link state is unknown, so writes are never retried.
#[derive(Debug, Error)]
#[error("display transport error: {0}")]
pub struct DisplayError(pub String);

/// Byte-oriented write access to the SPI bus.
pub trait SpiWrite {
    fn write(&mut self, data: &[u8]) -> Result<(), DisplayError>;
}

/// A push-pull GPIO output line.
pub trait GpioPin {
    fn set_high(&mut self) -> Result<(), DisplayError>;
    fn set_low(&mut self) -> Result<(), DisplayError>;
}

/// PCD8544 driver over generic SPI and GPIO lines.
pub struct Pcd8544<SPI, DC, RST> {
    spi: SPI,
    dc_pin: DC,
    rst_pin: RST,
}

impl<SPI, DC, RST> Pcd8544<SPI, DC, RST>
where
    SPI: SpiWrite,
    DC: GpioPin,
    RST: GpioPin,
{
    pub fn new(spi: SPI, dc_pin: DC, rst_pin: RST) -> Self {
        Self {
            spi,
            dc_pin,
            rst_pin,
        }
    }

    /// Hardware reset pulse: RST low then high, with settle time.
    fn reset(&mut self) -> Result<(), DisplayError> {
        self.rst_pin.set_low()?;
        thread::sleep(Duration::from_millis(10));
        self.rst_pin.set_high()?;
        thread::sleep(Duration::from_millis(10));
        Ok(())
    }

    /// Send one command byte (DC low).
    fn command(&mut self, command: u8) -> Result<(), DisplayError> {
        self.dc_pin.set_low()?;
        self.spi.write(&[command])
    }

    /// Send display data (DC high).
    fn data(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        self.dc_pin.set_high()?;
        self.spi.write(data)
    }

    /// Reset the chip and program contrast/bias, ending in basic instruction
    /// mode with the display active.
    pub fn init(&mut self, contrast: u8, bias: u8) -> Result<(), DisplayError> {
        self.reset()?;
        self.command(FUNCTION_SET | EXTENDED_INSTRUCTION)?;
        self.command(SET_BIAS | (bias & 0x07))?;
        self.command(SET_VOP | (contrast & 0x7F))?;
        self.command(FUNCTION_SET)?;
        self.command(DISPLAY_CONTROL | DISPLAY_NORMAL)?;
        Ok(())
    }

    /// Blank the panel's framebuffer.
    pub fn clear(&mut self) -> Result<(), DisplayError> {
        self.write_banks(&[0u8; LCD_BYTES])
    }

    /// Write a full bank-major framebuffer to the panel.
    pub fn display(&mut self, banks: &[u8]) -> Result<(), DisplayError> {
        if banks.len() != LCD_BYTES {
            return Err(DisplayError(format!(
                "framebuffer must be {} bytes, got {}",
                LCD_BYTES,
                banks.len()
            )));
        }
        self.write_banks(banks)
    }

    fn write_banks(&mut self, banks: &[u8]) -> Result<(), DisplayError> {
        // Rewind the address counters, then stream the whole buffer; the
        // chip advances column-then-bank on its own.
        self.command(SET_Y_ADDR)?;
        self.command(SET_X_ADDR)?;
        self.data(banks)
    }
}
