/// Minimum chamber count for the octree to test chambers in parallel with Rayon.
pub const PARALLEL_CHAMBER_THRESHOLD: usize = 64;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism in filters.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Imaginary-part tolerance under which a generalized eigenvalue of the
/// ellipsoid pencil is considered real.
pub const COLLISION_IMAG_TOLERANCE: f64 = 1e-5;

/// Blobs lighter than this cannot be fitted with an ellipsoid.
pub const MIN_BLOB_MASS: f64 = 1e-7;

/// Covariance eigenvalues at or below this value (pixel^2) mark a degenerate blob.
pub const MIN_COVARIANCE_EIGENVALUE: f64 = 1e-13;

/// Ellipsoid extents below this are treated as numerically degenerate
/// before octree insertion.
pub const MIN_ELLIPSOID_EXTENT: f64 = 1e-13;

/// Peaks with any bounding-box extent above this are implausible.
pub const PEAK_TOO_LARGE_LIMIT: f64 = 1e5;

/// Peaks with any bounding-box extent below this are implausible.
pub const PEAK_TOO_SMALL_LIMIT: f64 = 1e-5;

/// Hard upper bound on octree depth.
pub const MAX_OCTREE_DEPTH: usize = 10;

/// Default octree depth used by the peak finder.
pub const DEFAULT_OCTREE_MAX_DEPTH: usize = 6;

/// Default number of shapes a chamber holds before splitting.
pub const DEFAULT_OCTREE_MAX_STORAGE: usize = 6;

/// Default filtered-intensity threshold (counts) for a pixel to belong to a blob.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Default minimum number of pixels in a blob.
pub const DEFAULT_MIN_SIZE: usize = 30;

/// Default maximum number of pixels in a blob.
pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// Default scale applied to blob ellipsoids during collision merging.
pub const DEFAULT_PEAK_END: f64 = 1.0;

/// Default maximum frame-axis extent of a peak.
pub const DEFAULT_MAX_FRAMES: f64 = 10.0;

/// Default annular filter radii: peak disk, background inner, background outer.
pub const DEFAULT_ANNULAR_RADII: (f64, f64, f64) = (5.0, 10.0, 15.0);

/// Fraction of the searched frames between two progress updates.
pub const PROGRESS_STRIDE_FRACTION: f64 = 0.02;
