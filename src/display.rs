//! # Display Sinks
//!
//! The [`DisplaySink`] trait is the render loop's only view of the output
//! device: report dimensions, accept a finished frame, make it visible. The
//! push/show split mirrors the buffered-panel model: `push_frame` stages the
//! frame, `show` is the single transfer that makes it visible, so a frame is
//! never partially observable.
//!
//! Two sinks are provided: [`Pcd8544Display`] for the real panel and
//! [`TerminalDisplay`] for hardware-free development (`--stdout`).

use crate::frame::Frame;
use crate::pcd8544::{DisplayError, GpioPin, Pcd8544, SpiWrite, LCD_HEIGHT, LCD_WIDTH};

/// Accepts rendered frames and pushes them to physical output.
///
/// Exclusive ownership is the concurrency contract: a sink belongs to exactly
/// one render cycle at a time, enforced by the controller's stop/rendezvous
/// handshake rather than by a lock.
pub trait DisplaySink {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Blank the physical output.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Stage a completed frame for the next `show`.
    fn push_frame(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Make the staged frame visible, atomically from the caller's view.
    fn show(&mut self) -> Result<(), DisplayError>;
}

/// The real panel: stages the bank-packed framebuffer on push and streams it
/// to the chip on show.
pub struct Pcd8544Display<SPI, DC, RST> {
    driver: Pcd8544<SPI, DC, RST>,
    staged: Option<Vec<u8>>,
}

impl<SPI, DC, RST> Pcd8544Display<SPI, DC, RST>
where
    SPI: SpiWrite,
    DC: GpioPin,
    RST: GpioPin,
{
    /// Initialize the chip (reset pulse, contrast, bias) and return the sink.
    pub fn new(spi: SPI, dc: DC, rst: RST, contrast: u8, bias: u8) -> Result<Self, DisplayError> {
        let mut driver = Pcd8544::new(spi, dc, rst);
        driver.init(contrast, bias)?;
        Ok(Self {
            driver,
            staged: None,
        })
    }
}

impl<SPI, DC, RST> DisplaySink for Pcd8544Display<SPI, DC, RST>
where
    SPI: SpiWrite,
    DC: GpioPin,
    RST: GpioPin,
{
    fn width(&self) -> u32 {
        LCD_WIDTH
    }

    fn height(&self) -> u32 {
        LCD_HEIGHT
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.staged = None;
        self.driver.clear()
    }

    fn push_frame(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.staged = Some(frame.to_vertical_banks());
        Ok(())
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        match self.staged.take() {
            Some(banks) => self.driver.display(&banks),
            None => Ok(()),
        }
    }
}

/// Development sink: renders each shown frame as ASCII to stdout.
pub struct TerminalDisplay {
    width: u32,
    height: u32,
    staged: Option<Frame>,
}

impl TerminalDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            staged: None,
        }
    }
}

impl DisplaySink for TerminalDisplay {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.staged = None;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.staged = Some(frame.clone());
        Ok(())
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        if let Some(frame) = self.staged.take() {
            let mut out = String::with_capacity(((self.width + 3) * self.height) as usize);
            out.push_str(&"-".repeat(self.width as usize + 2));
            out.push('\n');
            for y in 0..self.height {
                out.push('|');
                for x in 0..self.width {
                    out.push(if frame.pixel(x, y) { '#' } else { ' ' });
                }
                out.push_str("|\n");
            }
            out.push_str(&"-".repeat(self.width as usize + 2));
            println!("{}", out);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_display_reports_dimensions() {
        let sink = TerminalDisplay::new(84, 48);
        assert_eq!(sink.width(), 84);
        assert_eq!(sink.height(), 48);
    }

    #[test]
    fn test_terminal_display_push_then_show() {
        let mut sink = TerminalDisplay::new(8, 8);
        let mut frame = Frame::new(8, 8);
        frame.set_pixel(0, 0, true);
        sink.push_frame(&frame).unwrap();
        sink.show().unwrap();
        // A second show without a push is a no-op
        sink.show().unwrap();
    }
}
