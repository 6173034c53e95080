use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    combine::combination::Combination,
    export::naming::output_file_name,
    export::report::{ExportFailure, ExportReport, FailureKind},
    export::write::{PngCompression, write_png},
    foundation::core::Canvas,
    foundation::error::{LayermixError, LayermixResult},
    render::composite::composite,
};

/// Export batch options.
#[derive(Clone, Debug)]
pub struct ExportOpts {
    /// Upper bound on worker threads. The pool never exceeds the machine's parallelism.
    pub max_workers: usize,
    /// PNG compression effort.
    pub compression: PngCompression,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            max_workers: 8,
            compression: PngCompression::Default,
        }
    }
}

impl ExportOpts {
    /// Reject a zero worker cap.
    pub fn validate(&self) -> LayermixResult<()> {
        if self.max_workers == 0 {
            return Err(LayermixError::validation(
                "export 'max_workers' must be >= 1",
            ));
        }
        Ok(())
    }

    /// Effective pool size: `min(max_workers, available parallelism)`.
    pub fn pool_size(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.max_workers.clamp(1, available.max(1))
    }
}

/// Cooperative cancellation flag shared between the caller and an export batch.
///
/// Tasks check the flag when they start; tasks already running finish normally.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`CancelToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives `(completed, total)` after every task that ran.
///
/// Calls are serialized and `completed` is strictly increasing within one batch.
pub trait ProgressSink: Sync {
    /// Called once per finished task, successful or not.
    fn on_progress(&self, completed: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Sync,
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Composite and write every combination to `out_dir`, in parallel.
///
/// Tasks are submitted in slice order onto a dedicated FIFO pool. A failing combination is
/// recorded in the report and the batch continues. Only setup problems (invalid options,
/// unusable output directory, pool creation) are returned as errors.
#[tracing::instrument(skip_all, fields(total = combinations.len(), out_dir = %out_dir.display()))]
pub fn export_all(
    combinations: &[Combination<'_>],
    canvas: Canvas,
    out_dir: &Path,
    opts: &ExportOpts,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> LayermixResult<ExportReport> {
    opts.validate()?;
    canvas.validate()?;
    std::fs::create_dir_all(out_dir).map_err(|e| {
        LayermixError::io(format!(
            "create output directory '{}': {e}",
            out_dir.display()
        ))
    })?;

    let total = combinations.len();
    if total == 0 {
        return Ok(ExportReport::new(0));
    }

    let workers = opts.pool_size();
    let pool = build_thread_pool(workers)?;
    tracing::info!(total, workers, "export started");

    let report = Mutex::new(ExportReport::new(total));
    pool.scope_fifo(|scope| {
        for combination in combinations {
            let report = &report;
            scope.spawn_fifo(move |_| {
                if cancel.is_cancelled() {
                    lock(report).skipped += 1;
                    return;
                }
                let file_name = output_file_name(combination);
                let outcome = export_one(combination, canvas, out_dir, &file_name, opts);

                let mut r = lock(report);
                match outcome {
                    Ok(()) => {
                        r.succeeded += 1;
                        tracing::debug!(id = combination.id, file = %file_name, "exported");
                    }
                    Err((kind, reason)) => {
                        tracing::warn!(id = combination.id, file = %file_name, %kind, %reason, "export failed");
                        r.failed += 1;
                        r.failures.push(ExportFailure {
                            combination_id: combination.id,
                            file_name,
                            kind,
                            reason,
                        });
                    }
                }
                progress.on_progress(r.completed(), r.total);
            });
        }
    });

    let mut report = report.into_inner().unwrap_or_else(PoisonError::into_inner);
    report.failures.sort_by_key(|f| f.combination_id);
    report.cancelled = report.skipped > 0;
    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        skipped = report.skipped,
        "export finished"
    );
    Ok(report)
}

fn export_one(
    combination: &Combination<'_>,
    canvas: Canvas,
    out_dir: &Path,
    file_name: &str,
    opts: &ExportOpts,
) -> Result<(), (FailureKind, String)> {
    let raster =
        composite(combination, canvas).map_err(|e| (FailureKind::Composite, e.to_string()))?;
    write_png(&raster, &out_dir.join(file_name), opts.compression)
        .map_err(|e| (FailureKind::Write, e.to_string()))
}

fn lock(report: &Mutex<ExportReport>) -> std::sync::MutexGuard<'_, ExportReport> {
    report.lock().unwrap_or_else(PoisonError::into_inner)
}

fn build_thread_pool(threads: usize) -> LayermixResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("layermix-export-{i}"))
        .build()
        .map_err(|e| LayermixError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/export/coordinator.rs"]
mod tests;
