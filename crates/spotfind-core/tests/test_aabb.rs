use approx::assert_relative_eq;
use nalgebra::Vector3;

use spotfind_core::geometry::{Aabb, Ellipsoid};

fn unit_box() -> Aabb {
    Aabb::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0))
}

// ---------------------------------------------------------------------------
// Point and box queries
// ---------------------------------------------------------------------------

#[test]
fn test_center_and_extents() {
    let b = Aabb::new(Vector3::new(-1.0, 2.0, 0.0), Vector3::new(3.0, 4.0, 10.0));
    assert_relative_eq!(b.center(), Vector3::new(1.0, 3.0, 5.0));
    assert_relative_eq!(b.extents(), Vector3::new(4.0, 2.0, 10.0));
}

#[test]
fn test_is_inside_includes_faces() {
    let b = unit_box();
    assert!(b.is_inside(&Vector3::new(0.5, 0.5, 0.5)));
    assert!(b.is_inside(&Vector3::new(0.0, 1.0, 0.5)));
    assert!(!b.is_inside(&Vector3::new(1.0001, 0.5, 0.5)));
}

#[test]
fn test_collide_touching_and_separated() {
    let a = unit_box();
    let mut b = unit_box();
    b.translate(&Vector3::new(1.0, 0.0, 0.0));
    assert!(a.collide(&b), "boxes sharing a face collide");

    b.translate(&Vector3::new(0.01, 0.0, 0.0));
    assert!(!a.collide(&b));
    assert!(!b.collide(&a));

    // Overlap on two axes is not enough.
    let c = Aabb::new(Vector3::new(0.5, 0.5, 2.0), Vector3::new(2.0, 2.0, 3.0));
    assert!(!a.collide(&c));
}

#[test]
fn test_contains_is_strict_on_every_face() {
    let outer = Aabb::new(Vector3::zeros(), Vector3::new(10.0, 10.0, 10.0));
    let inner = Aabb::new(Vector3::new(1.0, 1.0, 1.0), Vector3::new(9.0, 9.0, 9.0));
    assert!(outer.contains(&inner));
    assert!(!inner.contains(&outer));

    for axis in 0..3 {
        let mut lower = Vector3::new(1.0, 1.0, 1.0);
        lower[axis] = 0.0;
        let touching_low = Aabb::new(lower, Vector3::new(9.0, 9.0, 9.0));
        assert!(!outer.contains(&touching_low), "touches lower face {axis}");

        let mut upper = Vector3::new(9.0, 9.0, 9.0);
        upper[axis] = 10.0;
        let touching_high = Aabb::new(Vector3::new(1.0, 1.0, 1.0), upper);
        assert!(!outer.contains(&touching_high), "touches upper face {axis}");
    }
}

#[test]
fn test_translate_moves_both_bounds() {
    let mut b = unit_box();
    b.translate(&Vector3::new(2.0, -1.0, 0.5));
    assert_relative_eq!(*b.lower(), Vector3::new(2.0, -1.0, 0.5));
    assert_relative_eq!(*b.upper(), Vector3::new(3.0, 0.0, 1.5));
}

#[test]
fn test_nan_bounds_are_never_contained() {
    let outer = Aabb::new(Vector3::zeros(), Vector3::new(10.0, 10.0, 10.0));
    let broken = Aabb::new(
        Vector3::new(f64::NAN, 1.0, 1.0),
        Vector3::new(2.0, 2.0, 2.0),
    );
    assert!(broken.lower().x.is_nan());
    assert!(!outer.contains(&broken));
}

// ---------------------------------------------------------------------------
// Box / ellipsoid
// ---------------------------------------------------------------------------

#[test]
fn test_collide_ellipsoid_matches_ellipsoid_side() {
    let b = unit_box();
    let centers = [
        Vector3::new(0.5, 0.5, 0.5),
        Vector3::new(1.4, 0.5, 0.5),
        Vector3::new(1.6, 0.5, 0.5),
        Vector3::new(1.3, 1.3, 1.3),
        Vector3::new(-3.0, 0.0, 0.0),
    ];
    for center in centers {
        let e = Ellipsoid::sphere(center, 0.5).unwrap();
        assert_eq!(b.collide_ellipsoid(&e), e.collide_aabb(&b), "center {center:?}");
    }
    let near = Ellipsoid::sphere(Vector3::new(1.4, 0.5, 0.5), 0.5).unwrap();
    assert!(b.collide_ellipsoid(&near));
    let far = Ellipsoid::sphere(Vector3::new(1.6, 0.5, 0.5), 0.5).unwrap();
    assert!(!b.collide_ellipsoid(&far));
}

#[test]
fn test_corner_gap_between_sphere_and_box() {
    // The sphere's envelope overlaps the box corner, the sphere itself does not:
    // the distance from (1.3, 1.3, 1.3) to the corner is ~0.52.
    let b = unit_box();
    let e = Ellipsoid::sphere(Vector3::new(1.3, 1.3, 1.3), 0.5).unwrap();
    assert!(e.aabb().collide(&b));
    assert!(!b.collide_ellipsoid(&e));
}
