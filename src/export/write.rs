use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use image::ImageEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use crate::foundation::core::Raster;
use crate::foundation::error::{LayermixError, LayermixResult};

/// PNG compression effort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PngCompression {
    /// Fastest encode, larger files.
    Fast,
    /// Encoder default.
    #[default]
    Default,
    /// Smallest files, slowest encode.
    Best,
}

impl From<PngCompression> for CompressionType {
    fn from(value: PngCompression) -> Self {
        match value {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Encode `raster` as PNG and place it at `path` atomically.
///
/// The image is written to a hidden temp file next to `path` and renamed into place, so
/// readers never observe a half-written file. An existing file at `path` is replaced.
pub fn write_png(raster: &Raster, path: &Path, compression: PngCompression) -> LayermixResult<()> {
    let expected = u64::from(raster.width) * u64::from(raster.height) * 4;
    if raster.data.len() as u64 != expected || expected == 0 {
        return Err(LayermixError::validation(format!(
            "raster {}x{} holds {} bytes, cannot encode",
            raster.width,
            raster.height,
            raster.data.len()
        )));
    }
    place_png(raster, path, compression)
        .map_err(|e| LayermixError::io(format!("{e:#}")))
}

fn place_png(raster: &Raster, path: &Path, compression: PngCompression) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("'{}' has no file name", path.display()))?;
    let tmp = dir.join(format!(
        ".{}.{}.{}.tmp",
        file_name.to_string_lossy(),
        std::process::id(),
        TMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    let mut guard = TempFileGuard(Some(tmp.clone()));

    let file = File::create(&tmp).with_context(|| format!("create '{}'", tmp.display()))?;
    let mut writer = BufWriter::new(file);
    PngEncoder::new_with_quality(&mut writer, compression.into(), FilterType::Adaptive)
        .write_image(
            &raster.data,
            raster.width,
            raster.height,
            image::ExtendedColorType::Rgba8,
        )
        .with_context(|| format!("encode '{}'", path.display()))?;
    let file = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flush '{}'", tmp.display()))?;
    file.sync_all()
        .with_context(|| format!("sync '{}'", tmp.display()))?;
    drop(file);

    fs::rename(&tmp, path)
        .with_context(|| format!("rename '{}' -> '{}'", tmp.display(), path.display()))?;
    guard.0 = None;
    Ok(())
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/write.rs"]
mod tests;
