use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Peak search stage, used for status reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinderStage {
    Labeling,
    MergingEquivalences,
    MergingCollisions,
    EliminatingBlobs,
    ComputingPeaks,
    Done,
}

impl std::fmt::Display for FinderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Labeling => write!(f, "Finding blobs"),
            Self::MergingEquivalences => write!(f, "Merging equivalent blobs"),
            Self::MergingCollisions => write!(f, "Finding blob collisions"),
            Self::EliminatingBlobs => write!(f, "Eliminating blobs which are too small or too large"),
            Self::ComputingPeaks => write!(f, "Computing bounding boxes"),
            Self::Done => write!(f, "Peak finding completed"),
        }
    }
}

/// Thread-safe status sink for a running peak search.
///
/// All methods have default no-op implementations; the search result never
/// depends on the sink.
pub trait ProgressSink: Send + Sync {
    fn set_status(&self, _status: &str) {}

    /// Progress of the current stage, in `[0, 100]`.
    fn set_progress(&self, _percent: f64) {}

    fn log(&self, _message: &str) {}
}

pub(crate) struct NoOpSink;
impl ProgressSink for NoOpSink {}

/// Cooperative cancellation flag shared between a running search and its owner.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
