use std::fmt;

/// Why a single combination failed to export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Decoding or blending the layers failed.
    Composite,
    /// Persisting the composited raster failed. No partial file is left behind.
    Write,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Composite => "composite",
            Self::Write => "write",
        })
    }
}

/// One failed combination.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ExportFailure {
    /// [`crate::Combination::id`] of the failed combination.
    pub combination_id: usize,
    /// File name the combination would have been written to.
    pub file_name: String,
    /// Failure class.
    pub kind: FailureKind,
    /// Human-readable cause.
    pub reason: String,
}

/// Aggregate result of an export batch.
///
/// `succeeded + failed` is the number of tasks that actually ran; `skipped` counts tasks
/// that never started because the batch was cancelled.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExportReport {
    /// Combinations handed to the coordinator.
    pub total: usize,
    /// Combinations written to disk.
    pub succeeded: usize,
    /// Combinations that ran and failed.
    pub failed: usize,
    /// Combinations never started due to cancellation.
    pub skipped: usize,
    /// `true` when cancellation was observed before the batch finished.
    pub cancelled: bool,
    /// Per-combination failures, sorted by combination id.
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Tasks that ran to completion, successful or not.
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Return `true` when every combination was written.
    pub fn is_complete_success(&self) -> bool {
        self.succeeded == self.total
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} exported, {} failed",
            self.succeeded, self.total, self.failed
        )?;
        if self.cancelled {
            write!(f, ", {} skipped (cancelled)", self.skipped)?;
        }
        Ok(())
    }
}
