//! Boot splash image: a raw 1bpp bitmap shown for a fixed duration before the
//! first render cycle starts.
//!
//! The file format is the `embedded_graphics::image::ImageRaw` binary layout:
//! row-major, MSB first, each row padded to a byte boundary. A missing or
//! mis-sized file is a startup configuration error and aborts before the
//! controller loop is entered.

use std::fs;
use std::path::Path;

use embedded_graphics::image::{Image, ImageRaw};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use thiserror::Error;

use crate::frame::Frame;

/// Startup-time splash resource failure. Fatal before the loop starts.
#[derive(Debug, Error)]
pub enum SplashError {
    #[error("splash image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("splash image {path}: expected {expected} bytes for {width}x{height}, got {actual}")]
    Size {
        path: String,
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },
}

/// Load and validate a raw 1bpp splash image for a width×height panel.
pub fn load<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Vec<u8>, SplashError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| SplashError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let expected = (width.div_ceil(8) * height) as usize;
    if data.len() != expected {
        return Err(SplashError::Size {
            path: path.display().to_string(),
            expected,
            actual: data.len(),
            width,
            height,
        });
    }
    Ok(data)
}

/// Draw a loaded splash bitmap into a frame at the origin.
pub fn draw(frame: &mut Frame, data: &[u8], width: u32) {
    let raw = ImageRaw::<BinaryColor>::new(data, width);
    Image::new(&raw, Point::zero()).draw(frame).ok();
}
