use nalgebra::{Matrix3, SymmetricEigen, Vector3};

use crate::consts::{MIN_BLOB_MASS, MIN_COVARIANCE_EIGENVALUE};
use crate::error::{Result, SpotError};
use crate::geometry::Ellipsoid;

/// Principal-axis description of a blob: semi-axis lengths along the columns
/// of `axes`.
#[derive(Clone, Debug)]
pub struct EllipsoidFit {
    pub center: Vector3<f64>,
    pub radii: Vector3<f64>,
    pub axes: Matrix3<f64>,
}

impl EllipsoidFit {
    pub fn to_ellipsoid(&self) -> Result<Ellipsoid> {
        Ellipsoid::from_axes(self.center, self.radii, self.axes)
    }
}

/// Streaming intensity-weighted moments of a 3D pixel blob.
///
/// Samples are `(col, row, frame)` points weighted by their intensity. The
/// accumulator keeps the total mass, the weighted mean and the weighted
/// scatter matrix about the mean, updated with West's incremental formula so
/// that no large raw second moment is ever differenced.
#[derive(Clone, Debug)]
pub struct Blob {
    mass: f64,
    mean: Vector3<f64>,
    scatter: Matrix3<f64>,
    components: usize,
    min_value: f64,
    max_value: f64,
}

impl Default for Blob {
    fn default() -> Self {
        Self {
            mass: 0.0,
            mean: Vector3::zeros(),
            scatter: Matrix3::zeros(),
            components: 0,
            min_value: f64::INFINITY,
            max_value: f64::NEG_INFINITY,
        }
    }
}

impl Blob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blob holding one sample.
    pub fn from_point(col: f64, row: f64, frame: f64, intensity: f64) -> Self {
        let mut blob = Self::new();
        blob.add_point(col, row, frame, intensity);
        blob
    }

    pub fn add_point(&mut self, col: f64, row: f64, frame: f64, intensity: f64) {
        self.components += 1;
        self.min_value = self.min_value.min(intensity);
        self.max_value = self.max_value.max(intensity);

        let new_mass = self.mass + intensity;
        if new_mass <= 0.0 {
            self.mass = new_mass;
            return;
        }
        let point = Vector3::new(col, row, frame);
        let delta = point - self.mean;
        self.mean += delta * (intensity / new_mass);
        self.scatter += delta * delta.transpose() * (intensity * self.mass / new_mass);
        self.mass = new_mass;
    }

    /// Fold `other` into `self` (Chan et al. pairwise combination).
    pub fn merge(&mut self, other: &Blob) {
        if other.components == 0 {
            return;
        }
        if self.components == 0 {
            *self = other.clone();
            return;
        }
        self.components += other.components;
        self.min_value = self.min_value.min(other.min_value);
        self.max_value = self.max_value.max(other.max_value);

        let total = self.mass + other.mass;
        if total <= 0.0 || self.mass <= 0.0 || other.mass <= 0.0 {
            if other.mass > self.mass {
                self.mean = other.mean;
                self.scatter = other.scatter;
            }
            self.mass = total;
            return;
        }
        let delta = other.mean - self.mean;
        self.scatter += other.scatter + delta * delta.transpose() * (self.mass * other.mass / total);
        self.mean += delta * (other.mass / total);
        self.mass = total;
    }

    /// Number of pixels folded in, independent of their intensity.
    pub fn components(&self) -> usize {
        self.components
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn center_of_mass(&self) -> Vector3<f64> {
        self.mean
    }

    /// Weighted covariance of the pixel positions.
    pub fn covariance(&self) -> Option<Matrix3<f64>> {
        (self.mass >= MIN_BLOB_MASS).then(|| self.scatter / self.mass)
    }

    /// Diagonalize the covariance. Semi-axes are the standard deviations
    /// along the principal directions, multiplied by `scale`.
    pub fn fit(&self, scale: f64) -> Result<EllipsoidFit> {
        let covariance = self.covariance().ok_or_else(|| {
            SpotError::DegenerateShape(format!("blob mass {} too small to fit", self.mass))
        })?;
        let eigen = SymmetricEigen::new(covariance);
        if eigen
            .eigenvalues
            .iter()
            .any(|v| !v.is_finite() || *v <= MIN_COVARIANCE_EIGENVALUE)
        {
            return Err(SpotError::DegenerateShape(format!(
                "blob covariance is not positive-definite (eigenvalues {:?})",
                eigen.eigenvalues.as_slice()
            )));
        }
        Ok(EllipsoidFit {
            center: self.mean,
            radii: eigen.eigenvalues.map(|v| v.sqrt() * scale),
            axes: eigen.eigenvectors,
        })
    }

    pub fn to_ellipsoid(&self, scale: f64) -> Result<Ellipsoid> {
        self.fit(scale)?.to_ellipsoid()
    }
}
