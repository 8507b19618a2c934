pub mod convolve;
pub mod kernel;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_ANNULAR_RADII;
use crate::error::{Result, SpotError};

use self::convolve::fft_convolve;
use self::kernel::{annular_kernel, constant_kernel};

/// Smoothing applied to every frame before thresholding.
pub trait FrameFilter: Send + Sync {
    fn convolve(&self, frame: &Array2<f64>) -> Array2<f64>;

    /// Kernel half-size `(x_offset, y_offset)` in (columns, rows). The usable
    /// detector area is shrunk by this footprint on each side.
    fn kernel_size(&self) -> (usize, usize);
}

/// Filter selection, as stored in the finder configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FilterConfig {
    /// No smoothing.
    Delta,
    /// Box mean over a `(2r+1)^2` window.
    Constant { radius: usize },
    /// Local peak-disk mean minus local background-annulus mean.
    Annular { r1: f64, r2: f64, r3: f64 },
}

impl Default for FilterConfig {
    fn default() -> Self {
        let (r1, r2, r3) = DEFAULT_ANNULAR_RADII;
        Self::Annular { r1, r2, r3 }
    }
}

impl std::fmt::Display for FilterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delta => write!(f, "Delta"),
            Self::Constant { radius } => write!(f, "Constant (r={radius})"),
            Self::Annular { r1, r2, r3 } => write!(f, "Annular (r1={r1}, r2={r2}, r3={r3})"),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Delta | Self::Constant { .. } => Ok(()),
            Self::Annular { r1, r2, r3 } => annular_kernel(r1, r2, r3).map(|_| ()),
        }
    }

    pub fn build(&self) -> Result<Box<dyn FrameFilter>> {
        let filter: Box<dyn FrameFilter> = match *self {
            Self::Delta => Box::new(DeltaFilter),
            Self::Constant { radius } => Box::new(KernelFilter::new(constant_kernel(radius))?),
            Self::Annular { r1, r2, r3 } => {
                Box::new(KernelFilter::new(annular_kernel(r1, r2, r3)?)?)
            }
        };
        Ok(filter)
    }
}

/// Identity filter with an empty footprint.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeltaFilter;

impl FrameFilter for DeltaFilter {
    fn convolve(&self, frame: &Array2<f64>) -> Array2<f64> {
        frame.clone()
    }

    fn kernel_size(&self) -> (usize, usize) {
        (0, 0)
    }
}

/// FFT convolution with an odd-sized, centered kernel.
#[derive(Clone, Debug)]
pub struct KernelFilter {
    kernel: Array2<f64>,
}

impl KernelFilter {
    pub fn new(kernel: Array2<f64>) -> Result<Self> {
        let (h, w) = kernel.dim();
        if h % 2 == 0 || w % 2 == 0 {
            return Err(SpotError::InvalidConfig(format!(
                "filter kernel must have odd dimensions, got {w}x{h}"
            )));
        }
        Ok(Self { kernel })
    }

    pub fn kernel(&self) -> &Array2<f64> {
        &self.kernel
    }
}

impl FrameFilter for KernelFilter {
    fn convolve(&self, frame: &Array2<f64>) -> Array2<f64> {
        fft_convolve(frame, &self.kernel)
    }

    fn kernel_size(&self) -> (usize, usize) {
        let (h, w) = self.kernel.dim();
        (w / 2, h / 2)
    }
}
