use std::borrow::Cow;
use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::core::Raster,
    foundation::error::{LayermixError, LayermixResult},
    model::layer::RasterSource,
};

/// Decode encoded image bytes into a straight-alpha RGBA8 raster.
pub fn decode_image(bytes: &[u8]) -> LayermixResult<Raster> {
    decode_rgba8(bytes).map_err(into_decode)
}

/// Read and decode an image file.
pub fn load_image(path: impl AsRef<Path>) -> LayermixResult<Raster> {
    let path = path.as_ref();
    std::fs::read(path)
        .context("read file")
        .and_then(|bytes| decode_rgba8(&bytes))
        .with_context(|| format!("image '{}'", path.display()))
        .map_err(into_decode)
}

fn decode_rgba8(bytes: &[u8]) -> anyhow::Result<Raster> {
    let rgba = image::load_from_memory(bytes)
        .context("decode image from memory")?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Raster::from_rgba8(width, height, rgba.into_raw())?)
}

// Keeps the whole context chain in the message.
fn into_decode(err: anyhow::Error) -> LayermixError {
    LayermixError::decode(format!("{err:#}"))
}

/// Borrow an in-memory raster or decode a file-backed one.
pub(crate) fn resolve(source: &RasterSource) -> LayermixResult<Cow<'_, Raster>> {
    match source {
        RasterSource::Memory(raster) => Ok(Cow::Borrowed(raster.as_ref())),
        RasterSource::File(path) => load_image(path).map(Cow::Owned),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
