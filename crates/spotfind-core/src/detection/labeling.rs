use std::collections::BTreeMap;

use ndarray::Array2;

use super::blob::Blob;
use super::equivalence::EquivalenceList;

/// Result of labeling a frame range.
#[derive(Clone, Debug, Default)]
pub struct LabelingOutcome {
    /// One accumulator per provisional label.
    pub blobs: BTreeMap<usize, Blob>,
    /// Label pairs found to touch.
    pub equivalences: EquivalenceList,
    /// Next unused label.
    pub next_label: usize,
}

/// Frame-by-frame connected-component labeler over a 3D pixel stack.
///
/// Foreground pixels are connected through their left and top neighbors in
/// the same frame and the co-located pixel of the previous frame. Labels come
/// from an explicit counter owned by the labeler; independent labelers can
/// be given disjoint label ranges through [`Labeler::with_first_label`] and
/// their outcomes combined afterwards.
pub struct Labeler {
    n_rows: usize,
    n_cols: usize,
    current: Vec<usize>,
    previous: Vec<usize>,
    next_label: usize,
    frames_seen: usize,
    blobs: BTreeMap<usize, Blob>,
    equivalences: EquivalenceList,
}

impl Labeler {
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self::with_first_label(n_rows, n_cols, 1)
    }

    /// Labeler whose first allocated label is `first_label` (must be > 0,
    /// label 0 is background).
    pub fn with_first_label(n_rows: usize, n_cols: usize, first_label: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            current: vec![0; n_rows * n_cols],
            previous: vec![0; n_rows * n_cols],
            next_label: first_label.max(1),
            frames_seen: 0,
            blobs: BTreeMap::new(),
            equivalences: EquivalenceList::new(),
        }
    }

    pub fn next_label(&self) -> usize {
        self.next_label
    }

    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    /// Label one frame.
    ///
    /// `filtered` decides which pixels are foreground (`>= threshold`);
    /// `raw` provides the intensity folded into each blob. Both must be
    /// `(n_rows, n_cols)`.
    pub fn process_frame(
        &mut self,
        frame_index: usize,
        raw: &Array2<u32>,
        filtered: &Array2<f64>,
        threshold: f64,
    ) {
        debug_assert_eq!(raw.dim(), (self.n_rows, self.n_cols));
        debug_assert_eq!(filtered.dim(), (self.n_rows, self.n_cols));

        std::mem::swap(&mut self.current, &mut self.previous);
        let first_frame = self.frames_seen == 0;
        let n_cols = self.n_cols;

        for row in 0..self.n_rows {
            for col in 0..n_cols {
                let idx = row * n_cols + col;
                if filtered[[row, col]] < threshold || filtered[[row, col]].is_nan() {
                    self.current[idx] = 0;
                    continue;
                }

                let left = if col == 0 { 0 } else { self.current[idx - 1] };
                let top = if row == 0 { 0 } else { self.current[idx - n_cols] };
                let previous = if first_frame { 0 } else { self.previous[idx] };

                let label = self.assign_label(left, top, previous);
                self.current[idx] = label;

                let value = raw[[row, col]] as f64;
                self.blobs
                    .entry(label)
                    .or_default()
                    .add_point(col as f64, row as f64, frame_index as f64, value);
            }
        }
        self.frames_seen += 1;
    }

    // Neighbor code: bit 0 = left, bit 1 = top, bit 2 = previous frame.
    fn assign_label(&mut self, left: usize, top: usize, previous: usize) -> usize {
        let code = (left != 0) as u8 | ((top != 0) as u8) << 1 | ((previous != 0) as u8) << 2;
        let eq = &mut self.equivalences;
        match code {
            0 => {
                let label = self.next_label;
                self.next_label += 1;
                label
            }
            1 => left,
            2 => top,
            3 => {
                if top != left {
                    eq.register(top, left);
                }
                top
            }
            4 => previous,
            5 => {
                if left != previous {
                    eq.register(left, previous);
                }
                left
            }
            6 => {
                if top != previous {
                    eq.register(top, previous);
                }
                top
            }
            _ => {
                if top == left && top != previous {
                    eq.register(top, previous);
                } else if top == previous && top != left {
                    eq.register(top, left);
                } else if left == previous && left != top {
                    eq.register(left, top);
                } else if left != previous && left != top && top != previous {
                    eq.register(top, previous);
                    eq.register(top, left);
                    eq.register(left, previous);
                }
                left
            }
        }
    }

    pub fn finish(self) -> LabelingOutcome {
        LabelingOutcome {
            blobs: self.blobs,
            equivalences: self.equivalences,
            next_label: self.next_label,
        }
    }
}
