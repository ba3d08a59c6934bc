//! Owned in-memory drawing surface for a single chart.

use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;

/// Prefix turning a base64 PNG into a data URI.
pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Drawing area over an in-memory RGB buffer.
pub type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// RGB pixel buffer owned by one render.
///
/// Each chart gets its own canvas; it is released when the render returns,
/// whether drawing succeeded or not.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 3],
        }
    }

    /// Clear the canvas to white and run `draw` on it.
    pub fn draw<F>(&mut self, draw: F) -> Result<()>
    where
        F: FnOnce(&Area<'_>) -> Result<()>,
    {
        let root = BitMapBackend::with_buffer(&mut self.pixels, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
        Ok(())
    }

    /// Encode the canvas as PNG.
    pub fn into_png(self) -> Result<Vec<u8>> {
        let image = RgbImage::from_raw(self.width, self.height, self.pixels)
            .ok_or_else(|| anyhow!("canvas buffer does not match {}x{}", self.width, self.height))?;
        let mut png = Cursor::new(Vec::new());
        image.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}

/// Base64-encode PNG bytes, optionally as a data URI.
pub fn encode_png(png: &[u8], data_uri: bool) -> String {
    let encoded = STANDARD.encode(png);
    if data_uri {
        format!("{}{}", DATA_URI_PREFIX, encoded)
    } else {
        encoded
    }
}
