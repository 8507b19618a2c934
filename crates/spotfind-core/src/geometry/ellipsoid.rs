use nalgebra::{Matrix3, Matrix4, SymmetricEigen, Vector3};

use crate::consts::COLLISION_IMAG_TOLERANCE;
use crate::error::{Result, SpotError};

use super::aabb::Aabb;

/// Solid ellipsoid `{ x : (x - c)^T A (x - c) <= 1 }` with `A` symmetric
/// positive-definite.
///
/// The covariance `A^-1` and the axis-aligned envelope are cached and kept in
/// sync by every mutating operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Ellipsoid {
    center: Vector3<f64>,
    metric: Matrix3<f64>,
    inverse_metric: Matrix3<f64>,
    aabb: Aabb,
}

impl Ellipsoid {
    /// Build from a center and a metric tensor. Fails if the metric is not
    /// finite or not positive-definite.
    pub fn new(center: Vector3<f64>, metric: Matrix3<f64>) -> Result<Self> {
        if !center.iter().all(|v| v.is_finite()) || !metric.iter().all(|v| v.is_finite()) {
            return Err(SpotError::DegenerateShape(
                "non-finite ellipsoid center or metric".into(),
            ));
        }
        let metric = (metric + metric.transpose()) * 0.5;
        let inverse_metric = metric
            .cholesky()
            .map(|c| c.inverse())
            .ok_or_else(|| {
                SpotError::DegenerateShape("ellipsoid metric is not positive-definite".into())
            })?;
        if !inverse_metric.iter().all(|v| v.is_finite()) {
            return Err(SpotError::DegenerateShape(
                "ellipsoid metric is numerically singular".into(),
            ));
        }

        let mut ellipsoid = Self {
            center,
            metric,
            inverse_metric,
            aabb: Aabb::new(center, center),
        };
        ellipsoid.update_aabb();
        Ok(ellipsoid)
    }

    /// Build from semi-axis lengths and the matrix whose columns are the
    /// corresponding principal directions.
    pub fn from_axes(center: Vector3<f64>, radii: Vector3<f64>, axes: Matrix3<f64>) -> Result<Self> {
        if radii.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(SpotError::DegenerateShape(format!(
                "invalid ellipsoid radii {:?}",
                radii.as_slice()
            )));
        }
        let d = Matrix3::from_diagonal(&radii.map(|r| 1.0 / (r * r)));
        Self::new(center, axes * d * axes.transpose())
    }

    pub fn sphere(center: Vector3<f64>, radius: f64) -> Result<Self> {
        Self::from_axes(
            center,
            Vector3::repeat(radius),
            Matrix3::identity(),
        )
    }

    pub fn center(&self) -> &Vector3<f64> {
        &self.center
    }

    pub fn metric(&self) -> &Matrix3<f64> {
        &self.metric
    }

    pub fn inverse_metric(&self) -> &Matrix3<f64> {
        &self.inverse_metric
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Value of the quadratic form at `point`; `<= 1` inside.
    pub fn r2(&self, point: &Vector3<f64>) -> f64 {
        let u = point - self.center;
        u.dot(&(self.metric * u))
    }

    pub fn is_inside(&self, point: &Vector3<f64>) -> bool {
        self.r2(point) <= 1.0
    }

    /// Semi-axis lengths, one per eigenvector of the metric.
    pub fn radii(&self) -> Vector3<f64> {
        let eigen = SymmetricEigen::new(self.metric);
        eigen.eigenvalues.map(|v| 1.0 / v.sqrt())
    }

    pub fn volume(&self) -> f64 {
        const C: f64 = 4.0 * std::f64::consts::PI / 3.0;
        C * self.metric.determinant().powf(-0.5)
    }

    pub fn translate(&mut self, t: &Vector3<f64>) {
        self.center += t;
        self.update_aabb();
    }

    /// Scale every semi-axis by `value` about the center.
    pub fn scale(&mut self, value: f64) {
        debug_assert!(value > 0.0, "ellipsoid scale must be positive, got {value}");
        let v2 = value * value;
        self.metric /= v2;
        self.inverse_metric *= v2;
        self.update_aabb();
    }

    /// Rotate about the center by the orthogonal matrix `u`.
    pub fn rotate(&mut self, u: &Matrix3<f64>) {
        self.metric = u * self.metric * u.transpose();
        self.inverse_metric = u * self.inverse_metric * u.transpose();
        self.update_aabb();
    }

    /// 4x4 matrix `Q` with `[x 1] Q [x 1]^T = r2(x) - 1`.
    pub fn homogeneous_matrix(&self) -> Matrix4<f64> {
        let mc = self.metric * self.center;
        let mut q = Matrix4::zeros();
        q.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.metric);
        q.fixed_view_mut::<3, 1>(0, 3).copy_from(&(-mc));
        q.fixed_view_mut::<1, 3>(3, 0).copy_from(&(-mc).transpose());
        q[(3, 3)] = self.center.dot(&mc) - 1.0;
        q
    }

    /// Closed-form inverse of [`Self::homogeneous_matrix`].
    pub fn homogeneous_matrix_inverse(&self) -> Matrix4<f64> {
        let c = self.center;
        let mut q = Matrix4::zeros();
        q.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(self.inverse_metric - c * c.transpose()));
        q.fixed_view_mut::<3, 1>(0, 3).copy_from(&(-c));
        q.fixed_view_mut::<1, 3>(3, 0).copy_from(&(-c).transpose());
        q[(3, 3)] = -1.0;
        q
    }

    /// Center of the ellipse cut out by the plane through `point` with normal `normal`.
    pub fn intersection_center(&self, normal: &Vector3<f64>, point: &Vector3<f64>) -> Vector3<f64> {
        let ai_n = self.inverse_metric * normal;
        let lambda = (point.dot(normal) - self.center.dot(normal)) / normal.dot(&ai_n);
        self.center + ai_n * lambda
    }

    /// Ellipsoid/ellipsoid intersection test.
    ///
    /// Two ellipsoids with homogeneous matrices `A`, `B` are disjoint iff the
    /// pencil `A^-1 B` has a real, strictly negative eigenvalue (Choi, Wang &
    /// Liu, "Continuous Collision Detection for Elliptic Disks", Lemma 3,
    /// which carries over to any dimension). The AABB pre-check is required
    /// near tangency where the eigenvalues are ill-conditioned.
    pub fn collide(&self, other: &Ellipsoid) -> bool {
        if !self.aabb.collide(&other.aabb) {
            return false;
        }
        let pencil = self.homogeneous_matrix_inverse() * other.homogeneous_matrix();
        let roots = pencil.complex_eigenvalues();
        !roots
            .iter()
            .any(|r| r.im.abs() < COLLISION_IMAG_TOLERANCE && r.re < 0.0)
    }

    /// Ellipsoid/box intersection test.
    pub fn collide_aabb(&self, aabb: &Aabb) -> bool {
        if aabb.is_inside(&self.center) {
            return true;
        }

        let normals = [Vector3::x(), Vector3::y(), Vector3::z()];
        let lb = aabb.lower();
        let ub = aabb.upper();
        let dx = ub - lb;

        for i in 0..3 {
            let n0 = normals[i];
            let n1 = normals[(i + 1) % 3];
            let n2 = normals[(i + 2) % 3];

            let a = n0 * n0.dot(&dx);
            let b = n1 * n1.dot(&dx);

            if self.collide_face(lb, &a, &b, &n2) {
                return true;
            }
            if self.collide_face(ub, &(-a), &(-b), &n2) {
                return true;
            }
        }
        false
    }

    // The minimum of the quadratic form along x(t) = a + t(b - a) is either
    // at an endpoint or at the critical point of f(t).
    fn collide_segment(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
        if self.is_inside(a) || self.is_inside(b) {
            return true;
        }
        let ba = b - a;
        let aba = self.metric * ba;
        let t = -(a - self.center).dot(&aba) / ba.dot(&aba);
        if !(0.0..=1.0).contains(&t) {
            return false;
        }
        self.is_inside(&(a + ba * t))
    }

    // Face spanned by `a` and `b` from corner `o`, lying in the plane with normal `n`.
    // Minimize the quadratic form on the plane with a Lagrange multiplier; if
    // the minimizer falls outside the face, the minimum is on one of its edges.
    fn collide_face(
        &self,
        o: &Vector3<f64>,
        a: &Vector3<f64>,
        b: &Vector3<f64>,
        n: &Vector3<f64>,
    ) -> bool {
        let d = n.dot(o);
        let ai_n = self.inverse_metric * n;
        let n_ai_n = n.dot(&ai_n);
        let lagrange = (d - n.dot(&self.center)) / n_ai_n;

        // ellipsoid does not reach the plane
        if lagrange * lagrange * n_ai_n > 1.0 {
            return false;
        }

        let x = self.center + ai_n * lagrange;
        let t = a.dot(&(x - o)) / a.dot(a);
        let s = b.dot(&(x - o)) / b.dot(b);
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&s) {
            return true;
        }

        let oa = o + a;
        let ob = o + b;
        let oab = o + a + b;
        self.collide_segment(o, &oa)
            || self.collide_segment(o, &ob)
            || self.collide_segment(&oa, &oab)
            || self.collide_segment(&ob, &oab)
    }

    fn update_aabb(&mut self) {
        let a = Vector3::new(
            self.inverse_metric[(0, 0)].sqrt(),
            self.inverse_metric[(1, 1)].sqrt(),
            self.inverse_metric[(2, 2)].sqrt(),
        );
        self.aabb = Aabb::new(self.center - a, self.center + a);
    }
}
