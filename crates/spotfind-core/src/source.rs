use ndarray::{Array2, Array3, Axis};

use crate::error::{Result, SpotError};
use crate::mask::DetectorMask;

/// Random-access stack of detector frames.
pub trait FrameSource {
    fn n_frames(&self) -> usize;
    fn n_rows(&self) -> usize;
    fn n_cols(&self) -> usize;

    /// Counts of frame `index`, shape `(n_rows, n_cols)`. May block on I/O.
    fn frame(&self, index: usize) -> Result<Array2<u32>>;

    fn masks(&self) -> &[Box<dyn DetectorMask>] {
        &[]
    }
}

/// In-memory frame stack, shape `(frames, rows, cols)`.
pub struct ImageStack {
    data: Array3<u32>,
    masks: Vec<Box<dyn DetectorMask>>,
}

impl ImageStack {
    pub fn new(data: Array3<u32>) -> Result<Self> {
        let (frames, rows, cols) = data.dim();
        if frames == 0 || rows == 0 || cols == 0 {
            return Err(SpotError::EmptyStack);
        }
        Ok(Self {
            data,
            masks: Vec::new(),
        })
    }

    /// Stack equally-sized frames.
    pub fn from_frames(frames: &[Array2<u32>]) -> Result<Self> {
        let first = frames.first().ok_or(SpotError::EmptyStack)?;
        let (rows, cols) = first.dim();
        if let Some(bad) = frames.iter().find(|f| f.dim() != (rows, cols)) {
            return Err(SpotError::DimensionMismatch {
                expected: (rows, cols),
                got: bad.dim(),
            });
        }
        let mut data = Array3::<u32>::zeros((frames.len(), rows, cols));
        for (mut slot, frame) in data.axis_iter_mut(Axis(0)).zip(frames) {
            slot.assign(frame);
        }
        Self::new(data)
    }

    pub fn add_mask(&mut self, mask: Box<dyn DetectorMask>) {
        self.masks.push(mask);
    }

    pub fn with_mask(mut self, mask: Box<dyn DetectorMask>) -> Self {
        self.add_mask(mask);
        self
    }

    pub fn data(&self) -> &Array3<u32> {
        &self.data
    }
}

impl FrameSource for ImageStack {
    fn n_frames(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    fn n_rows(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    fn n_cols(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    fn frame(&self, index: usize) -> Result<Array2<u32>> {
        let total = self.n_frames();
        if index >= total {
            return Err(SpotError::FrameIndexOutOfRange { index, total });
        }
        Ok(self.data.index_axis(Axis(0), index).to_owned())
    }

    fn masks(&self) -> &[Box<dyn DetectorMask>] {
        &self.masks
    }
}
