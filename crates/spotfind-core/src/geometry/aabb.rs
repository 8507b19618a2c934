use nalgebra::Vector3;

use super::ellipsoid::Ellipsoid;

/// Axis-aligned bounding box in (col, row, frame) space.
///
/// Used as the envelope of a blob ellipsoid, as the usable detector volume
/// and as the bounds of every octree node. Bounds are inclusive. No value is
/// clamped: NaN bounds make every containment test fail, which the peak
/// rejection step relies on to flag broken geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    lower: Vector3<f64>,
    upper: Vector3<f64>,
}

impl Aabb {
    pub fn new(lower: Vector3<f64>, upper: Vector3<f64>) -> Self {
        debug_assert!(
            (0..3).all(|i| !(lower[i] > upper[i])),
            "AABB lower bound {lower:?} exceeds upper bound {upper:?}"
        );
        Self { lower, upper }
    }

    /// Box spanning `[0, extents]` on every axis.
    pub fn from_extents(extents: Vector3<f64>) -> Self {
        Self::new(Vector3::zeros(), extents)
    }

    pub fn lower(&self) -> &Vector3<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Vector3<f64> {
        &self.upper
    }

    pub fn center(&self) -> Vector3<f64> {
        (self.lower + self.upper) * 0.5
    }

    pub fn extents(&self) -> Vector3<f64> {
        self.upper - self.lower
    }

    pub fn is_inside(&self, point: &Vector3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.lower[i] && point[i] <= self.upper[i])
    }

    /// Separating-axis test: two boxes are disjoint iff they are separated
    /// along at least one coordinate axis.
    pub fn collide(&self, other: &Aabb) -> bool {
        for i in 0..3 {
            if self.upper[i] < other.lower[i] || other.upper[i] < self.lower[i] {
                return false;
            }
        }
        true
    }

    pub fn collide_ellipsoid(&self, ellipsoid: &Ellipsoid) -> bool {
        ellipsoid.collide_aabb(self)
    }

    /// Strict containment: `other` lies inside `self` without touching any
    /// of the six faces.
    pub fn contains(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.lower[i] < other.lower[i] && other.upper[i] < self.upper[i])
    }

    pub fn translate(&mut self, t: &Vector3<f64>) {
        self.lower += t;
        self.upper += t;
    }

    /// Sub-box obtained by bisecting every axis at the center. Bit `i` of
    /// `sector` selects the upper half along axis `i`.
    pub(crate) fn octant(&self, sector: usize) -> Aabb {
        let center = self.center();
        let mut lower = self.lower;
        let mut upper = self.upper;
        for i in 0..3 {
            if sector & (1 << i) != 0 {
                lower[i] = center[i];
            } else {
                upper[i] = center[i];
            }
        }
        Aabb { lower, upper }
    }
}
