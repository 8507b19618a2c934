pub mod consts;
pub mod detection;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod mask;
pub mod progress;
pub mod source;

pub use detection::{Peak, PeakFinder, PeakFinderConfig, PeakSearch, RejectionFlags, RejectionSummary};
pub use error::{Result, SpotError};
pub use filters::{FilterConfig, FrameFilter};
pub use geometry::{Aabb, Ellipsoid, Octree};
pub use mask::{BoxMask, DetectorMask, EllipseMask};
pub use progress::{CancelFlag, FinderStage, ProgressSink};
pub use source::{FrameSource, ImageStack};
