use approx::assert_abs_diff_eq;
use ndarray::Array2;

use spotfind_core::filters::convolve::fft_convolve;
use spotfind_core::filters::kernel::{annular_kernel, constant_kernel};
use spotfind_core::filters::{DeltaFilter, FilterConfig, FrameFilter, KernelFilter};
use spotfind_core::SpotError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ramp(h: usize, w: usize) -> Array2<f64> {
    Array2::from_shape_fn((h, w), |(r, c)| (r * w + c) as f64)
}

fn impulse(h: usize, w: usize, at: (usize, usize), value: f64) -> Array2<f64> {
    let mut data = Array2::zeros((h, w));
    data[at] = value;
    data
}

// ---------------------------------------------------------------------------
// Kernels
// ---------------------------------------------------------------------------

#[test]
fn test_constant_kernel_sums_to_one() {
    let k = constant_kernel(2);
    assert_eq!(k.dim(), (5, 5));
    assert_abs_diff_eq!(k.sum(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_annular_kernel_is_zero_mean() {
    let k = annular_kernel(2.0, 3.0, 5.0).unwrap();
    assert_eq!(k.dim(), (11, 11));
    assert_abs_diff_eq!(k.sum(), 0.0, epsilon = 1e-12);
    assert!(k[[5, 5]] > 0.0);
    assert!(k[[5, 1]] < 0.0, "distance 4 is in the annulus");
    assert_eq!(k[[5, 7]], 0.0, "distance 2 is between disk and annulus");
}

#[test]
fn test_annular_kernel_rejects_bad_radii() {
    for (r1, r2, r3) in [(0.0, 1.0, 2.0), (3.0, 2.0, 4.0), (1.0, 2.0, 2.0), (1.0, 2.0, f64::INFINITY)] {
        assert!(
            matches!(annular_kernel(r1, r2, r3), Err(SpotError::InvalidConfig(_))),
            "({r1}, {r2}, {r3})"
        );
    }
}

// ---------------------------------------------------------------------------
// FFT convolution
// ---------------------------------------------------------------------------

#[test]
fn test_identity_kernel() {
    let image = ramp(13, 17);
    let mut k = Array2::zeros((3, 3));
    k[[1, 1]] = 1.0;
    let out = fft_convolve(&image, &k);
    assert_eq!(out.dim(), image.dim());
    for (a, b) in out.iter().zip(image.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
    }
}

#[test]
fn test_offset_kernel_shifts_right() {
    let image = impulse(9, 9, (4, 4), 1.0);
    let mut k = Array2::zeros((3, 3));
    k[[1, 2]] = 1.0;
    let out = fft_convolve(&image, &k);
    assert_abs_diff_eq!(out[[4, 5]], 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(out[[4, 4]], 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(out[[4, 3]], 0.0, epsilon = 1e-9);
}

#[test]
fn test_box_blur_spreads_impulse() {
    let image = impulse(32, 32, (16, 16), 25.0);
    let out = fft_convolve(&image, &constant_kernel(2));
    assert_abs_diff_eq!(out[[16, 16]], 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(out[[14, 18]], 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(out[[13, 16]], 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(out.sum(), 25.0, epsilon = 1e-8);
}

#[test]
fn test_mirror_padding_preserves_flat_image_at_edges() {
    let image = Array2::from_elem((10, 14), 42.0);
    let out = fft_convolve(&image, &constant_kernel(3));
    for v in out.iter() {
        assert_abs_diff_eq!(*v, 42.0, epsilon = 1e-9);
    }
}

// ---------------------------------------------------------------------------
// Frame filters
// ---------------------------------------------------------------------------

#[test]
fn test_delta_filter_is_identity() {
    let image = ramp(5, 6);
    assert_eq!(DeltaFilter.convolve(&image), image);
    assert_eq!(DeltaFilter.kernel_size(), (0, 0));
}

#[test]
fn test_kernel_filter_requires_odd_kernel() {
    assert!(matches!(
        KernelFilter::new(Array2::zeros((4, 3))),
        Err(SpotError::InvalidConfig(_))
    ));
    let filter = KernelFilter::new(Array2::zeros((3, 7))).unwrap();
    assert_eq!(filter.kernel_size(), (3, 1));
}

#[test]
fn test_annular_filter_on_flat_background_is_zero() {
    let filter = FilterConfig::Annular { r1: 2.0, r2: 3.0, r3: 5.0 }.build().unwrap();
    assert_eq!(filter.kernel_size(), (5, 5));
    let out = filter.convolve(&Array2::from_elem((20, 20), 300.0));
    for v in out.iter() {
        assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-8);
    }
}

#[test]
fn test_annular_filter_highlights_spot() {
    let mut image = Array2::from_elem((40, 40), 10.0);
    for r in 19..22 {
        for c in 19..22 {
            image[[r, c]] = 110.0;
        }
    }
    let filter = FilterConfig::Annular { r1: 2.0, r2: 3.0, r3: 5.0 }.build().unwrap();
    let out = filter.convolve(&image);
    // Every peak-disk pixel (distance < 2) around (20, 20) lies in the spot.
    assert!(out[[20, 20]] > 90.0);
    assert_abs_diff_eq!(out[[5, 5]], 0.0, epsilon = 1e-8);
}

#[test]
fn test_filter_config_builds_matching_footprints() {
    assert_eq!(FilterConfig::Delta.build().unwrap().kernel_size(), (0, 0));
    assert_eq!(
        FilterConfig::Constant { radius: 2 }.build().unwrap().kernel_size(),
        (2, 2)
    );
    assert_eq!(FilterConfig::default().build().unwrap().kernel_size(), (15, 15));
    assert!(FilterConfig::Annular { r1: 4.0, r2: 3.0, r3: 5.0 }.build().is_err());
}
