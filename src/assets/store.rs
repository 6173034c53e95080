use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::{
    assets::decode::load_image,
    foundation::core::{Canvas, Raster},
    foundation::error::{LayermixError, LayermixResult},
    model::layer::RasterSource,
    model::stack::LayerStack,
};

/// Outcome of [`preload_rasters`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// Variants now held in memory.
    pub decoded: usize,
    /// Variants left file-backed, sorted by path.
    pub failures: Vec<PreloadFailure>,
}

/// A variant that could not be preloaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreloadFailure {
    /// Image file of the variant.
    pub path: PathBuf,
    /// Display form of the error.
    pub reason: String,
}

/// Decode every file-backed variant of the enabled groups into memory, in parallel.
///
/// After this call every combination of the session shares the decoded rasters instead of
/// decoding per combination. A variant that fails to decode, or whose size differs from
/// `canvas`, keeps its file source; the export then reports it per combination.
#[tracing::instrument(skip(stack))]
pub fn preload_rasters(stack: &mut LayerStack, canvas: Option<Canvas>) -> PreloadReport {
    let decoded = AtomicUsize::new(0);
    let mut failures: Vec<PreloadFailure> = stack
        .groups_mut()
        .par_iter_mut()
        .filter(|g| g.enabled)
        .flat_map(|g| g.variants.par_iter_mut())
        .filter_map(|variant| {
            let RasterSource::File(path) = &variant.source else {
                return None;
            };
            let path = path.clone();
            match load_fitting(&path, canvas) {
                Ok(raster) => {
                    variant.source = RasterSource::Memory(Arc::new(raster));
                    decoded.fetch_add(1, Ordering::Relaxed);
                    None
                }
                Err(e) => {
                    tracing::warn!(image = %path.display(), error = %e, "preload failed, image stays on disk");
                    Some(PreloadFailure {
                        path,
                        reason: e.to_string(),
                    })
                }
            }
        })
        .collect();
    failures.sort_by(|a, b| a.path.cmp(&b.path));

    let decoded = decoded.into_inner();
    tracing::debug!(decoded, failed = failures.len(), "rasters preloaded");
    PreloadReport { decoded, failures }
}

fn load_fitting(path: &Path, canvas: Option<Canvas>) -> LayermixResult<Raster> {
    let raster = load_image(path)?;
    if let Some(canvas) = canvas
        && !raster.fits(canvas)
    {
        return Err(LayermixError::validation(format!(
            "image '{}' is {}x{}, canvas is {}x{}",
            path.display(),
            raster.width,
            raster.height,
            canvas.width,
            canvas.height
        )));
    }
    Ok(raster)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
