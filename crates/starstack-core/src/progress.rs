/// Processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum ProcessStage {
    Stacking,
    Aligning,
    Deconvolving,
    Writing,
}

impl std::fmt::Display for ProcessStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stacking => write!(f, "Stacking"),
            Self::Aligning => write!(f, "Aligning"),
            Self::Deconvolving => write!(f, "Deconvolving"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Thread-safe progress reporting with cooperative cancellation.
///
/// Implementors can drive progress bars, logging, or other UI feedback.
/// All methods have default no-op implementations; `is_cancelled` is polled
/// once per frame (stacking/aligning) or per iteration (deconvolution), so
/// a cancel request costs at most one extra unit of work.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items
    /// (e.g., frame count or iteration count), if known.
    fn begin_stage(&self, _stage: ProcessStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// A per-step status line (transform summary, convergence signal).
    fn message(&self, _text: &str) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}

    /// Poll-able cancellation flag.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// No-op reporter for callers that do not track progress.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
