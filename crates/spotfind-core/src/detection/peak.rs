use bitflags::bitflags;

use crate::geometry::Ellipsoid;

bitflags! {
    /// Reasons a candidate peak is not selected. A peak may carry several.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RejectionFlags: u8 {
        /// Envelope extent implausibly large or small.
        const OUTSIDE_SIZE_BOUNDS = 1 << 0;
        /// Spread over more frames than allowed.
        const OUTSIDE_FRAMES      = 1 << 1;
        /// Not fully inside the usable detector area.
        const OUTSIDE_DETECTOR    = 1 << 2;
        /// Intersects a detector mask.
        const MASKED              = 1 << 3;
    }
}

impl RejectionFlags {
    fn label(self) -> &'static str {
        match self {
            RejectionFlags::OUTSIDE_SIZE_BOUNDS => "outside size bounds",
            RejectionFlags::OUTSIDE_FRAMES => "outside frame count bounds",
            RejectionFlags::OUTSIDE_DETECTOR => "not fully on detector",
            RejectionFlags::MASKED => "masked",
            _ => "unknown",
        }
    }
}

impl std::fmt::Display for RejectionFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(flag.label())?;
        }
        Ok(())
    }
}

/// A candidate peak: the fitted shape of one surviving blob plus the reasons,
/// if any, it should not be used.
#[derive(Clone, Debug)]
pub struct Peak {
    pub shape: Ellipsoid,
    pub flags: RejectionFlags,
    /// Pixel count of the source blob.
    pub components: usize,
    /// Summed raw intensity of the source blob.
    pub mass: f64,
    pub max_value: f64,
}

impl Peak {
    pub fn enabled(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Per-cause rejection counts. A peak with several flags counts once per flag
/// and once in `rejected`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RejectionSummary {
    pub total: usize,
    pub rejected: usize,
    pub outside_size_bounds: usize,
    pub outside_frames: usize,
    pub outside_detector: usize,
    pub masked: usize,
}

impl RejectionSummary {
    pub fn from_peaks(peaks: &[Peak]) -> Self {
        let mut summary = Self {
            total: peaks.len(),
            ..Self::default()
        };
        for peak in peaks {
            if !peak.enabled() {
                summary.rejected += 1;
            }
            for flag in peak.flags.iter() {
                if let Some(count) = summary.count_mut(flag) {
                    *count += 1;
                }
            }
        }
        summary
    }

    /// Peaks carrying `flag`, which must be a single reason; zero otherwise.
    pub fn count(&self, flag: RejectionFlags) -> usize {
        match flag {
            RejectionFlags::OUTSIDE_SIZE_BOUNDS => self.outside_size_bounds,
            RejectionFlags::OUTSIDE_FRAMES => self.outside_frames,
            RejectionFlags::OUTSIDE_DETECTOR => self.outside_detector,
            RejectionFlags::MASKED => self.masked,
            _ => 0,
        }
    }

    fn count_mut(&mut self, flag: RejectionFlags) -> Option<&mut usize> {
        match flag {
            RejectionFlags::OUTSIDE_SIZE_BOUNDS => Some(&mut self.outside_size_bounds),
            RejectionFlags::OUTSIDE_FRAMES => Some(&mut self.outside_frames),
            RejectionFlags::OUTSIDE_DETECTOR => Some(&mut self.outside_detector),
            RejectionFlags::MASKED => Some(&mut self.masked),
            _ => None,
        }
    }

    pub fn accepted(&self) -> usize {
        self.total - self.rejected
    }
}

/// Outcome of [`crate::detection::PeakFinder::find`].
#[derive(Clone, Debug, Default)]
pub struct PeakSearch {
    /// Every candidate in ascending blob-label order, rejected ones included.
    pub peaks: Vec<Peak>,
    pub summary: RejectionSummary,
}

impl PeakSearch {
    /// Candidates with no rejection flag.
    pub fn enabled(&self) -> impl Iterator<Item = &Peak> {
        self.peaks.iter().filter(|p| p.enabled())
    }
}
