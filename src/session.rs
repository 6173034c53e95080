use std::path::Path;

use crate::{
    combine::combination::Combination,
    combine::generator::{CombinationGenerator, EmptyReason, GenerationOutcome},
    combine::mutex::{MutexConflict, MutexEvaluator},
    export::coordinator::{CancelToken, ExportOpts, ProgressSink, export_all},
    export::report::ExportReport,
    foundation::core::{Canvas, Raster},
    foundation::error::LayermixResult,
    model::stack::{LayerSnapshot, LayerStack},
    render::composite::composite,
};

/// What an export run produced.
#[derive(Clone, Debug)]
pub enum ExportOutcome {
    /// The configuration has nothing to combine; no files were written.
    NothingToExport(EmptyReason),
    /// Every combination was rejected by mutex rules; no files were written.
    AllExcluded {
        /// Number of rejected combinations.
        rejected: usize,
        /// Sample of violated rules.
        conflicts: Vec<MutexConflict>,
    },
    /// The batch ran.
    Exported(ExportReport),
}

/// One generation + export run over a frozen copy of a [`LayerStack`].
///
/// Later edits to the stack do not affect the session.
#[derive(Clone, Debug)]
pub struct ExportSession {
    snapshot: LayerSnapshot,
    canvas: Canvas,
}

impl ExportSession {
    /// Snapshot and validate `stack` for export onto `canvas`.
    pub fn new(stack: &LayerStack, canvas: Canvas) -> LayermixResult<Self> {
        canvas.validate()?;
        Ok(Self {
            snapshot: stack.snapshot()?,
            canvas,
        })
    }

    /// Frozen layer model.
    pub fn snapshot(&self) -> &LayerSnapshot {
        &self.snapshot
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Enumerate legal combinations without rendering anything.
    pub fn plan(&self) -> GenerationOutcome<'_> {
        CombinationGenerator::new(&self.snapshot).generate()
    }

    /// The editor's current selection.
    pub fn current_selection(&self) -> Combination<'_> {
        Combination::current_selection(&self.snapshot)
    }

    /// Mutex rules violated by the current selection; empty when it is legal.
    pub fn check_current(&self) -> Vec<MutexConflict> {
        MutexEvaluator.conflicts(&self.current_selection().picks)
    }

    /// Composite the current selection.
    pub fn preview(&self) -> LayermixResult<Raster> {
        composite(&self.current_selection(), self.canvas)
    }

    /// Generate every legal combination and export it to `out_dir`.
    ///
    /// Options are validated before generation starts.
    pub fn export(
        &self,
        out_dir: &Path,
        opts: &ExportOpts,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> LayermixResult<ExportOutcome> {
        opts.validate()?;
        match self.plan() {
            GenerationOutcome::ConfigurationEmpty(reason) => {
                Ok(ExportOutcome::NothingToExport(reason))
            }
            GenerationOutcome::AllCombinationsExcluded {
                rejected,
                conflicts,
            } => Ok(ExportOutcome::AllExcluded {
                rejected,
                conflicts,
            }),
            GenerationOutcome::Ready(combinations) => export_all(
                &combinations,
                self.canvas,
                out_dir,
                opts,
                progress,
                cancel,
            )
            .map(ExportOutcome::Exported),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
