use crate::geometry::{Aabb, Ellipsoid};

/// A detector region whose peaks must be rejected.
pub trait DetectorMask: Send + Sync {
    fn collide(&self, shape: &Ellipsoid) -> bool;
}

/// Axis-aligned box mask in (col, row, frame) space.
#[derive(Clone, Debug)]
pub struct BoxMask {
    aabb: Aabb,
}

impl BoxMask {
    pub fn new(aabb: Aabb) -> Self {
        Self { aabb }
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }
}

impl DetectorMask for BoxMask {
    fn collide(&self, shape: &Ellipsoid) -> bool {
        shape.collide_aabb(&self.aabb)
    }
}

/// Ellipsoidal mask, e.g. a beam stop shadow.
#[derive(Clone, Debug)]
pub struct EllipseMask {
    ellipsoid: Ellipsoid,
}

impl EllipseMask {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self { ellipsoid }
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

impl DetectorMask for EllipseMask {
    fn collide(&self, shape: &Ellipsoid) -> bool {
        self.ellipsoid.collide(shape)
    }
}
