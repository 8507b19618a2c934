use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::consts::{
    MIN_ELLIPSOID_EXTENT, PEAK_TOO_LARGE_LIMIT, PEAK_TOO_SMALL_LIMIT, PROGRESS_STRIDE_FRACTION,
};
use crate::error::{Result, SpotError};
use crate::filters::FrameFilter;
use crate::geometry::{Aabb, Ellipsoid, Octree};
use crate::progress::{CancelFlag, FinderStage, NoOpSink, ProgressSink};
use crate::source::FrameSource;

use super::blob::Blob;
use super::config::PeakFinderConfig;
use super::equivalence::EquivalenceList;
use super::labeling::{Labeler, LabelingOutcome};
use super::peak::{Peak, PeakSearch, RejectionFlags, RejectionSummary};

/// Detector volume `(cols, rows, frames)`.
type Volume = (usize, usize, usize);

/// Blob-based peak search over a stack of detector frames.
///
/// A search runs through these stages:
/// 1. label connected above-threshold pixels frame by frame, accumulating one
///    [`Blob`] per provisional label;
/// 2. merge blobs whose labels were found to touch;
/// 3. repeatedly merge blobs whose `peak_end`-scaled ellipsoids intersect,
///    until the blob count stops changing, then drop blobs outside the
///    configured pixel-count range;
/// 4. fit the final ellipsoid of each blob and flag implausible candidates.
///
/// Per-blob failures (degenerate covariance) drop the blob; only frame I/O
/// errors and cancellation end a search early.
pub struct PeakFinder {
    config: PeakFinderConfig,
    filter: Box<dyn FrameFilter>,
    sink: Arc<dyn ProgressSink>,
    cancel: Option<CancelFlag>,
}

impl PeakFinder {
    pub fn new(config: PeakFinderConfig) -> Result<Self> {
        config.validate()?;
        let filter = config.filter.build()?;
        Ok(Self {
            config,
            filter,
            sink: Arc::new(NoOpSink),
            cancel: None,
        })
    }

    /// Replace the filter built from the configuration.
    pub fn with_filter(mut self, filter: Box<dyn FrameFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &PeakFinderConfig {
        &self.config
    }

    pub fn filter(&self) -> &dyn FrameFilter {
        self.filter.as_ref()
    }

    /// Run the whole search over `source`.
    pub fn find(&self, source: &dyn FrameSource) -> Result<PeakSearch> {
        let volume = (source.n_cols(), source.n_rows(), source.n_frames());
        if volume.0 == 0 || volume.1 == 0 || volume.2 == 0 {
            return Err(SpotError::EmptyStack);
        }
        self.config.log();

        let range = self.config.frame_range(volume.2);
        let LabelingOutcome {
            mut blobs,
            equivalences,
            ..
        } = self.find_primary_blobs(source, range)?;

        self.set_stage(FinderStage::MergingEquivalences);
        let before = blobs.len();
        merge_equivalent_blobs(&mut blobs, &equivalences);
        info!(
            equivalences = equivalences.len(),
            before,
            after = blobs.len(),
            "Merged equivalent blobs"
        );

        self.merge_colliding_blobs(&mut blobs, volume)?;

        let peaks = self.build_peaks(&blobs, source, volume);
        let summary = RejectionSummary::from_peaks(&peaks);
        info!(
            peaks = summary.total,
            accepted = summary.accepted(),
            outside_size_bounds = summary.outside_size_bounds,
            outside_frames = summary.outside_frames,
            outside_detector = summary.outside_detector,
            masked = summary.masked,
            "Peak search complete"
        );
        self.set_stage(FinderStage::Done);
        self.sink.log(&format!("Found {} peaks", summary.total));

        Ok(PeakSearch { peaks, summary })
    }

    fn find_primary_blobs(
        &self,
        source: &dyn FrameSource,
        range: Range<usize>,
    ) -> Result<LabelingOutcome> {
        let (n_rows, n_cols) = (source.n_rows(), source.n_cols());
        let total = range.len();
        self.set_stage(FinderStage::Labeling);
        info!(
            first_frame = range.start,
            end_frame = range.end,
            rows = n_rows,
            cols = n_cols,
            "Labeling frames"
        );

        let stride = ((total as f64 * PROGRESS_STRIDE_FRACTION) as usize).max(1);
        let mut labeler = Labeler::new(n_rows, n_cols);
        for (done, index) in range.enumerate() {
            self.check_cancelled()?;

            let raw = source.frame(index)?;
            if raw.dim() != (n_rows, n_cols) {
                return Err(SpotError::DimensionMismatch {
                    expected: (n_rows, n_cols),
                    got: raw.dim(),
                });
            }
            let filtered = self.filter.convolve(&raw.mapv(|v| v as f64));
            if filtered.dim() != (n_rows, n_cols) {
                return Err(SpotError::DimensionMismatch {
                    expected: (n_rows, n_cols),
                    got: filtered.dim(),
                });
            }
            labeler.process_frame(index, &raw, &filtered, self.config.threshold);

            if (done + 1) % stride == 0 || done + 1 == total {
                self.sink.set_progress(100.0 * (done + 1) as f64 / total as f64);
            }
        }

        let outcome = labeler.finish();
        info!(
            frames = total,
            blobs = outcome.blobs.len(),
            equivalences = outcome.equivalences.len(),
            "Labeling complete"
        );
        self.sink.log(&format!(
            "Found {} primary blobs in {total} frames",
            outcome.blobs.len()
        ));
        Ok(outcome)
    }

    /// Merge blobs whose scaled ellipsoids intersect until no merge happens,
    /// then drop blobs outside `[min_size, max_size]` pixels.
    ///
    /// `volume` is the detector extent `(cols, rows, frames)` covered by the
    /// collision octree.
    pub fn merge_colliding_blobs(
        &self,
        blobs: &mut BTreeMap<usize, Blob>,
        volume: (usize, usize, usize),
    ) -> Result<()> {
        let mut iteration = 0;
        loop {
            self.check_cancelled()?;
            iteration += 1;
            let before = blobs.len();
            self.sink.log(&format!("number of blobs is {before}"));

            let equivalences = self.find_collisions(blobs, volume)?;
            merge_equivalent_blobs(blobs, &equivalences);
            debug!(
                iteration,
                before,
                collisions = equivalences.len(),
                after = blobs.len(),
                "Collision merge iteration"
            );
            if blobs.len() == before {
                break;
            }
        }
        info!(iterations = iteration, blobs = blobs.len(), "Collision merging converged");

        self.eliminate_blobs(blobs);
        Ok(())
    }

    // Blobs whose scaled fit fails or is numerically flat are dropped here.
    fn find_collisions(
        &self,
        blobs: &mut BTreeMap<usize, Blob>,
        volume: Volume,
    ) -> Result<EquivalenceList> {
        self.set_stage(FinderStage::MergingCollisions);

        let mut shapes: Vec<Ellipsoid> = Vec::with_capacity(blobs.len());
        let mut labels: Vec<usize> = Vec::with_capacity(blobs.len());
        let peak_end = self.config.peak_end;
        blobs.retain(|&label, blob| {
            let shape = blob.fit(peak_end).and_then(|fit| {
                if fit.radii.min() < MIN_ELLIPSOID_EXTENT {
                    return Err(SpotError::DegenerateShape(format!(
                        "blob {label} extent below {MIN_ELLIPSOID_EXTENT}"
                    )));
                }
                fit.to_ellipsoid()
            });
            match shape {
                Ok(shape) => {
                    shapes.push(shape);
                    labels.push(label);
                    true
                }
                Err(err) => {
                    debug!(label, %err, "Dropping blob");
                    false
                }
            }
        });
        self.sink.set_progress(50.0);

        let (n_cols, n_rows, n_frames) = volume;
        let bounds = Aabb::from_extents(Vector3::new(
            n_cols as f64,
            n_rows as f64,
            n_frames as f64,
        ));
        let mut octree = Octree::with_limits(
            bounds,
            self.config.octree.max_depth,
            self.config.octree.max_storage,
        )?;
        for id in 0..shapes.len() {
            if !octree.insert(id, &shapes) {
                debug!(label = labels[id], "Blob ellipsoid outside the detector volume");
            }
        }

        let mut equivalences = EquivalenceList::new();
        for (a, b) in octree.collisions(&shapes) {
            equivalences.register(labels[a], labels[b]);
        }
        self.sink.set_progress(100.0);
        self.sink.log(&format!("Found {} equivalences", equivalences.len()));
        Ok(equivalences)
    }

    fn eliminate_blobs(&self, blobs: &mut BTreeMap<usize, Blob>) {
        self.set_stage(FinderStage::EliminatingBlobs);
        let (min, max) = (self.config.min_size, self.config.max_size);
        let before = blobs.len();
        blobs.retain(|_, blob| (min..=max).contains(&blob.components()));
        info!(before, after = blobs.len(), min, max, "Eliminated blobs by size");
        self.sink
            .log(&format!("After elimination, {} blobs remain", blobs.len()));
        self.sink.set_progress(100.0);
    }

    fn build_peaks(
        &self,
        blobs: &BTreeMap<usize, Blob>,
        source: &dyn FrameSource,
        volume: Volume,
    ) -> Vec<Peak> {
        self.set_stage(FinderStage::ComputingPeaks);
        let detector = self.detector_box(volume);
        let masks = source.masks();

        let mut peaks = Vec::with_capacity(blobs.len());
        for (&label, blob) in blobs {
            let shape = match blob.to_ellipsoid(1.0) {
                Ok(shape) => shape,
                Err(err) => {
                    warn!(label, %err, "Dropping blob with degenerate final fit");
                    continue;
                }
            };

            let mut flags = RejectionFlags::empty();
            let extents = shape.aabb().extents();
            // NaN extents fail both comparisons, so test the negation.
            if !(extents.max() <= PEAK_TOO_LARGE_LIMIT && extents.min() >= PEAK_TOO_SMALL_LIMIT) {
                flags.insert(RejectionFlags::OUTSIDE_SIZE_BOUNDS);
            }
            if !(extents.z <= self.config.max_frames) {
                flags.insert(RejectionFlags::OUTSIDE_FRAMES);
            }
            if !detector.contains(shape.aabb()) {
                flags.insert(RejectionFlags::OUTSIDE_DETECTOR);
            }
            if masks.iter().any(|mask| mask.collide(&shape)) {
                flags.insert(RejectionFlags::MASKED);
            }

            peaks.push(Peak {
                shape,
                flags,
                components: blob.components(),
                mass: blob.mass(),
                max_value: blob.max_value(),
            });
        }
        peaks
    }

    /// Usable detector volume: the image shrunk by the filter footprint, over
    /// frames `0..=n_frames - 1`.
    fn detector_box(&self, (n_cols, n_rows, n_frames): Volume) -> Aabb {
        let (xo, yo) = self.filter.kernel_size();
        let (xo, yo) = (xo as f64, yo as f64);
        let upper_x = (n_cols as f64 - xo).max(xo);
        let upper_y = (n_rows as f64 - yo).max(yo);
        Aabb::new(
            Vector3::new(xo, yo, 0.0),
            Vector3::new(upper_x, upper_y, n_frames.saturating_sub(1) as f64),
        )
    }

    fn set_stage(&self, stage: FinderStage) {
        self.sink.set_status(&stage.to_string());
        self.sink.set_progress(0.0);
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => {
                warn!("Peak search cancelled");
                Err(SpotError::Cancelled)
            }
            _ => Ok(()),
        }
    }
}

/// Fold every blob into the blob of its canonical label and drop the merged
/// labels. Returns how many blobs disappeared.
pub fn merge_equivalent_blobs(
    blobs: &mut BTreeMap<usize, Blob>,
    equivalences: &EquivalenceList,
) -> usize {
    let before = blobs.len();
    for (label, root) in equivalences.reduce() {
        let Some(blob) = blobs.remove(&label) else {
            continue;
        };
        match blobs.get_mut(&root) {
            Some(target) => target.merge(&blob),
            None => {
                blobs.insert(root, blob);
            }
        }
    }
    before - blobs.len()
}
