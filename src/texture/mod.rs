//! RGBA8 texture sampling for density and height maps.
//!
//! The generation pipeline never talks to a renderer directly: an injected
//! [`TextureSource`] hands over a raw pixel buffer once per regeneration,
//! and the owned [`TextureRgba`] copy answers all per-pixel queries after
//! that. Out-of-range reads return 0 and out-of-range writes are no-ops.

use std::path::Path;

use crate::core::{Error, Result};

/// Opaque provider of an RGBA8 pixel buffer.
///
/// Stands in for a renderer-owned texture handle; `read_rgba8` is a
/// synchronous readback and a fatal precondition when it fails.
pub trait TextureSource {
    /// Pull the full pixel buffer plus `(width, height)`.
    fn read_rgba8(&self) -> Result<(Vec<u8>, usize, usize)>;
}

/// An owned width x height grid of 4-channel byte pixels.
#[derive(Clone, Debug, Default)]
pub struct TextureRgba {
    data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl TextureRgba {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing RGBA8 buffer. Fails if the length does not match
    /// `4 * width * height`.
    pub fn from_raw(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        if data.len() != 4 * width * height {
            return Err(Error::TextureRead(format!(
                "buffer length {} does not match {}x{} RGBA8",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { data, width, height })
    }

    /// Re-read the pixel buffer from the source, replacing any previous
    /// contents. Called once per regeneration cycle.
    pub fn read(&mut self, source: &dyn TextureSource) -> Result<()> {
        let (data, width, height) = source.read_rgba8()?;
        if data.len() != 4 * width * height {
            return Err(Error::TextureRead(format!(
                "source returned {} bytes for {}x{}",
                data.len(),
                width,
                height
            )));
        }
        self.data = data;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Whether a buffer has been read.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte at `(x, y)` in the given channel (0-3), or 0 when any
    /// coordinate is out of range.
    pub fn get(&self, x: i32, y: i32, channel: usize) -> u8 {
        if x < 0 || y < 0 || channel >= 4 {
            return 0;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[4 * (x + y * self.width) + channel]
    }

    /// Bounds-checked write; silently a no-op out of range.
    pub fn set(&mut self, x: i32, y: i32, channel: usize, value: u8) {
        if x < 0 || y < 0 || channel >= 4 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        self.data[4 * (x + y * self.width) + channel] = value;
    }

    /// Write the buffer as a PNG, for debug inspection.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            &self.data,
            self.width as u32,
            self.height as u32,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }
}

/// A single-color source, handy for tests and placeholder maps.
#[derive(Clone, Copy, Debug)]
pub struct UniformSource {
    pub value: [u8; 4],
    pub width: usize,
    pub height: usize,
}

impl TextureSource for UniformSource {
    fn read_rgba8(&self) -> Result<(Vec<u8>, usize, usize)> {
        let mut data = Vec::with_capacity(4 * self.width * self.height);
        for _ in 0..self.width * self.height {
            data.extend_from_slice(&self.value);
        }
        Ok((data, self.width, self.height))
    }
}
