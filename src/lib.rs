//! layermix combines layered sprite parts into every legal variant and composites them to PNG.
//!
//! A layer model is a set of named groups, each holding interchangeable image variants. The
//! public API follows one path:
//!
//! - Build a [`LayerStack`] in code, through [`LayerCommand`]s, or from a [`ProjectFile`]
//! - Freeze it into an [`ExportSession`]
//! - [`ExportSession::plan`] the legal combinations or [`ExportSession::export`] them
//!
//! Variants pair up through a two-digit [`SequenceTag`] prefix (`"00"` matches every tag) and
//! can exclude each other through [`MutexTarget`] rules.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod combine;
mod export;
mod foundation;
mod model;
mod project;
mod render;
mod session;

pub use crate::foundation::core::{Canvas, Raster};
pub use crate::foundation::error::{LayermixError, LayermixResult};

pub use crate::assets::decode::{decode_image, load_image};
pub use crate::assets::store::{PreloadFailure, PreloadReport, preload_rasters};
pub use crate::combine::combination::{Combination, Pick, Picks};
pub use crate::combine::generator::{
    CartesianProduct, CombinationGenerator, EmptyReason, GenerationOutcome,
    MAX_REPORTED_CONFLICTS,
};
pub use crate::combine::mutex::{MutexConflict, MutexEvaluator};
pub use crate::combine::sequence::{SequenceIndex, TagCandidates};
pub use crate::export::coordinator::{CancelToken, ExportOpts, ProgressSink, export_all};
pub use crate::export::naming::output_file_name;
pub use crate::export::report::{ExportFailure, ExportReport, FailureKind};
pub use crate::export::write::{PngCompression, write_png};
pub use crate::model::command::LayerCommand;
pub use crate::model::layer::{ImageVariant, LayerGroup, MutexTarget, RasterSource, VariantId};
pub use crate::model::stack::{LayerSnapshot, LayerStack};
pub use crate::model::tag::SequenceTag;
pub use crate::project::{LoadOpts, ProjectFile, ProjectLayer};
pub use crate::render::composite::{composite, composite_picks};
pub use crate::session::{ExportOutcome, ExportSession};
