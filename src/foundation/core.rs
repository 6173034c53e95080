use crate::foundation::error::{LayermixError, LayermixResult};

/// Output canvas dimensions in pixels.
///
/// Every variant raster of a session is pre-aligned to this canvas at `(0, 0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Canvas size used by projects that do not record one.
    pub const DEFAULT_SIZE: u32 = 922;

    /// Create a validated canvas with both dimensions > 0.
    pub fn new(width: u32, height: u32) -> LayermixResult<Self> {
        let canvas = Self { width, height };
        canvas.validate()?;
        Ok(canvas)
    }

    /// Reject zero-sized canvases.
    pub fn validate(self) -> LayermixResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LayermixError::validation(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Byte length of a tightly packed RGBA8 buffer covering the canvas.
    pub fn rgba8_len(self) -> LayermixResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| LayermixError::validation("canvas buffer size overflow"))
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_SIZE,
            height: Self::DEFAULT_SIZE,
        }
    }
}

/// Straight-alpha RGBA8 raster, tightly packed, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes (not premultiplied).
    pub data: Vec<u8>,
}

impl Raster {
    /// Fully transparent raster covering `canvas`.
    pub fn transparent(canvas: Canvas) -> LayermixResult<Self> {
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.rgba8_len()?],
        })
    }

    /// Wrap raw RGBA8 bytes, checking the length against `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> LayermixResult<Self> {
        let expected = Canvas { width, height }.rgba8_len()?;
        if data.len() != expected {
            return Err(LayermixError::validation(format!(
                "raster {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Fill a raster of `canvas` size with a single straight-alpha color.
    pub fn solid(canvas: Canvas, rgba: [u8; 4]) -> LayermixResult<Self> {
        let len = canvas.rgba8_len()?;
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            data: rgba.repeat(len / 4),
        })
    }

    /// Return `true` when the raster matches `canvas` exactly.
    pub fn fits(&self, canvas: Canvas) -> bool {
        self.width == canvas.width && self.height == canvas.height
    }

    /// Read one pixel; `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
