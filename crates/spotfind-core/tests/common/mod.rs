use std::ops::Range;

use nalgebra::Vector3;
use ndarray::{s, Array3};

use spotfind_core::detection::PeakFinderConfig;
use spotfind_core::filters::FilterConfig;
use spotfind_core::geometry::Ellipsoid;
use spotfind_core::source::ImageStack;

/// `(frames, rows, cols)` counts filled with `background`.
pub fn flat_stack(frames: usize, rows: usize, cols: usize, background: u32) -> Array3<u32> {
    Array3::from_elem((frames, rows, cols), background)
}

/// Set every pixel of the box `frames x rows x cols` to `value`.
pub fn paint_block(
    data: &mut Array3<u32>,
    frames: Range<usize>,
    rows: Range<usize>,
    cols: Range<usize>,
    value: u32,
) {
    data.slice_mut(s![frames, rows, cols]).fill(value);
}

pub fn image_stack(data: Array3<u32>) -> ImageStack {
    ImageStack::new(data).expect("non-empty stack")
}

/// Unfiltered configuration: every pixel at or above `threshold` is foreground.
pub fn delta_config(threshold: f64, min_size: usize, max_size: usize) -> PeakFinderConfig {
    PeakFinderConfig {
        threshold,
        min_size,
        max_size,
        filter: FilterConfig::Delta,
        ..PeakFinderConfig::default()
    }
}

/// Spheres of `radius` centered on the integer lattice `1..=n` along each axis.
pub fn sphere_lattice(n: usize, radius: f64) -> Vec<Ellipsoid> {
    let mut shapes = Vec::with_capacity(n * n * n);
    for i in 1..=n {
        for j in 1..=n {
            for k in 1..=n {
                let center = Vector3::new(i as f64, j as f64, k as f64);
                shapes.push(Ellipsoid::sphere(center, radius).expect("valid sphere"));
            }
        }
    }
    shapes
}
