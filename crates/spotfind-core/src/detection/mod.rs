pub mod blob;
pub mod config;
pub mod equivalence;
pub mod finder;
pub mod labeling;
pub mod peak;

pub use blob::{Blob, EllipsoidFit};
pub use config::{OctreeConfig, PeakFinderConfig};
pub use equivalence::EquivalenceList;
pub use finder::{merge_equivalent_blobs, PeakFinder};
pub use labeling::{Labeler, LabelingOutcome};
pub use peak::{Peak, PeakSearch, RejectionFlags, RejectionSummary};
