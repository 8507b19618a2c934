pub mod aabb;
pub mod ellipsoid;
pub mod octree;

pub use aabb::Aabb;
pub use ellipsoid::Ellipsoid;
pub use octree::{Chambers, CollisionPair, Octree};
