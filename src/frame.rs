//! # Frame Buffer
//!
//! A fixed-size 1-bit-per-pixel buffer sized from the display sink's reported
//! dimensions. A fresh blank frame is created for every render iteration and
//! pushed by reference; nothing is retained or reused across ticks.
//!
//! The buffer is packed row-major, most significant bit first, which is the
//! same layout `embedded_graphics::image::ImageRaw` uses, so the splash
//! image file can be blitted without conversion. The PCD8544 itself wants its
//! framebuffer in vertical banks (each byte is a column of eight pixels), so
//! [`Frame::to_vertical_banks`] converts on the way out.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

/// A 1bpp monochrome frame, row-major, MSB-first within each byte.
#[derive(Clone, Debug)]
pub struct Frame {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl Frame {
    /// Create a blank (all pixels off) frame.
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8);
        Self {
            width,
            height,
            bits: vec![0x00; (bytes_per_row * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set a single pixel. Out-of-bounds coordinates are clipped.
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let bytes_per_row = self.width.div_ceil(8);
        let index = (y * bytes_per_row + x / 8) as usize;
        let mask = 0x80 >> (x % 8);
        if on {
            self.bits[index] |= mask;
        } else {
            self.bits[index] &= !mask;
        }
    }

    /// Read a single pixel. Out-of-bounds coordinates read as off.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let bytes_per_row = self.width.div_ceil(8);
        let index = (y * bytes_per_row + x / 8) as usize;
        self.bits[index] & (0x80 >> (x % 8)) != 0
    }

    /// Number of lit pixels in one row, for test assertions.
    pub fn lit_in_row(&self, y: u32) -> u32 {
        (0..self.width).filter(|&x| self.pixel(x, y)).count() as u32
    }

    /// Repack into the PCD8544's bank-major layout: `height/8` banks of
    /// `width` bytes, where bit N of each byte is the pixel N rows into the
    /// bank (LSB at the top). Heights that are not a multiple of eight pad
    /// the final bank with off pixels.
    pub fn to_vertical_banks(&self) -> Vec<u8> {
        let banks = self.height.div_ceil(8);
        let mut out = Vec::with_capacity((banks * self.width) as usize);
        for bank in 0..banks {
            for x in 0..self.width {
                let mut byte = 0u8;
                for bit in 0..8 {
                    if self.pixel(x, bank * 8 + bit) {
                        byte |= 1 << bit;
                    }
                }
                out.push(byte);
            }
        }
        out
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}
