use ndarray::Array2;

use crate::error::{Result, SpotError};

/// Uniform `(2r+1) x (2r+1)` box normalized to unit sum.
pub fn constant_kernel(radius: usize) -> Array2<f64> {
    let size = 2 * radius + 1;
    Array2::from_elem((size, size), 1.0 / (size * size) as f64)
}

/// Peak-minus-background kernel.
///
/// Pixels closer than `r1` to the center average into the peak term, pixels
/// with `r2 <= d < r3` average into the background term; the response is the
/// difference of the two means.
pub fn annular_kernel(r1: f64, r2: f64, r3: f64) -> Result<Array2<f64>> {
    if !(r1 > 0.0 && r1 <= r2 && r2 < r3 && r3.is_finite()) {
        return Err(SpotError::InvalidConfig(format!(
            "annular radii must satisfy 0 < r1 <= r2 < r3, got ({r1}, {r2}, {r3})"
        )));
    }
    let half = r3.ceil() as usize;
    let size = 2 * half + 1;
    let distance = |i: usize, j: usize| {
        let di = i as f64 - half as f64;
        let dj = j as f64 - half as f64;
        (di * di + dj * dj).sqrt()
    };

    let mut n_peak = 0usize;
    let mut n_bkg = 0usize;
    for i in 0..size {
        for j in 0..size {
            let d = distance(i, j);
            if d < r1 {
                n_peak += 1;
            } else if d >= r2 && d < r3 {
                n_bkg += 1;
            }
        }
    }
    if n_bkg == 0 {
        return Err(SpotError::InvalidConfig(format!(
            "annulus [{r2}, {r3}) contains no pixel"
        )));
    }

    let peak_weight = 1.0 / n_peak as f64;
    let bkg_weight = -1.0 / n_bkg as f64;
    Ok(Array2::from_shape_fn((size, size), |(i, j)| {
        let d = distance(i, j);
        if d < r1 {
            peak_weight
        } else if d >= r2 && d < r3 {
            bkg_weight
        } else {
            0.0
        }
    }))
}
