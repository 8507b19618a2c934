use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_MAX_FRAMES, DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE, DEFAULT_OCTREE_MAX_DEPTH,
    DEFAULT_OCTREE_MAX_STORAGE, DEFAULT_PEAK_END, DEFAULT_THRESHOLD, MAX_OCTREE_DEPTH,
};
use crate::error::{Result, SpotError};
use crate::filters::FilterConfig;

/// Limits of the octree used for collision merging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OctreeConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_storage")]
    pub max_storage: usize,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_OCTREE_MAX_DEPTH,
            max_storage: DEFAULT_OCTREE_MAX_STORAGE,
        }
    }
}

/// Parameters of a peak search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakFinderConfig {
    /// Filtered intensity at or above which a pixel is foreground.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Blobs with fewer pixels are discarded.
    #[serde(default = "default_min_size")]
    pub min_size: usize,
    /// Blobs with more pixels are discarded.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Scale of the blob ellipsoids tested for collisions.
    #[serde(default = "default_peak_end")]
    pub peak_end: f64,
    /// Peaks extending over more frames are rejected.
    #[serde(default = "default_max_frames")]
    pub max_frames: f64,
    /// First frame to search; -1 for the start of the stack.
    #[serde(default = "default_frame_bound")]
    pub first_frame: i64,
    /// One past the last frame to search; -1 for the end of the stack.
    #[serde(default = "default_frame_bound")]
    pub last_frame: i64,
    #[serde(default)]
    pub octree: OctreeConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}
fn default_min_size() -> usize {
    DEFAULT_MIN_SIZE
}
fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}
fn default_peak_end() -> f64 {
    DEFAULT_PEAK_END
}
fn default_max_frames() -> f64 {
    DEFAULT_MAX_FRAMES
}
fn default_frame_bound() -> i64 {
    -1
}
fn default_max_depth() -> usize {
    DEFAULT_OCTREE_MAX_DEPTH
}
fn default_max_storage() -> usize {
    DEFAULT_OCTREE_MAX_STORAGE
}

impl Default for PeakFinderConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            peak_end: DEFAULT_PEAK_END,
            max_frames: DEFAULT_MAX_FRAMES,
            first_frame: -1,
            last_frame: -1,
            octree: OctreeConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

impl PeakFinderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.octree.max_depth == 0 || self.octree.max_depth > MAX_OCTREE_DEPTH {
            return Err(SpotError::InvalidConfig(format!(
                "octree max_depth must be in 1..={MAX_OCTREE_DEPTH}, got {}",
                self.octree.max_depth
            )));
        }
        if self.octree.max_storage == 0 {
            return Err(SpotError::InvalidConfig(
                "octree max_storage must be at least 1".into(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(SpotError::InvalidConfig(format!(
                "min_size {} exceeds max_size {}",
                self.min_size, self.max_size
            )));
        }
        if !(self.peak_end.is_finite() && self.peak_end > 0.0) {
            return Err(SpotError::InvalidConfig(format!(
                "peak_end must be positive, got {}",
                self.peak_end
            )));
        }
        if self.threshold.is_nan() || self.max_frames.is_nan() {
            return Err(SpotError::InvalidConfig(
                "threshold and max_frames must be numbers".into(),
            ));
        }
        self.filter.validate()
    }

    /// Frame range `[begin, end)` to search in a stack of `n_frames`, with
    /// -1 meaning "whole stack" and every bound clamped into `[0, n_frames]`.
    pub fn frame_range(&self, n_frames: usize) -> std::ops::Range<usize> {
        let clamp = |v: i64| v.clamp(0, n_frames as i64) as usize;
        let begin = if self.first_frame == -1 { 0 } else { clamp(self.first_frame) };
        let end = if self.last_frame == -1 {
            n_frames
        } else {
            clamp(self.last_frame)
        };
        begin..end.max(begin)
    }

    pub fn log(&self) {
        tracing::info!(
            threshold = self.threshold,
            min_size = self.min_size,
            max_size = self.max_size,
            peak_end = self.peak_end,
            max_frames = self.max_frames,
            first_frame = self.first_frame,
            last_frame = self.last_frame,
            octree_depth = self.octree.max_depth,
            octree_storage = self.octree.max_storage,
            filter = %self.filter,
            "Peak finder parameters"
        );
    }
}
