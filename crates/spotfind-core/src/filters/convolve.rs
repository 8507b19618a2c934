use std::sync::Arc;

use ndarray::{Array2, Axis};
use num_complex::Complex;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Convolve `image` with a centered `(2*kr + 1) x (2*kc + 1)` kernel.
///
/// The image is mirror-padded by the kernel half-size on every side so the
/// circular FFT convolution never wraps real data onto the output block.
pub fn fft_convolve(image: &Array2<f64>, kernel: &Array2<f64>) -> Array2<f64> {
    let (h, w) = image.dim();
    if h == 0 || w == 0 {
        return image.clone();
    }
    let (kh, kw) = kernel.dim();
    let (kr, kc) = (kh / 2, kw / 2);

    let padded = mirror_pad(image, kr, kc);
    let (ph, pw) = padded.dim();

    // Kernel laid out with its center at (0, 0), negative offsets wrapped.
    let mut wrapped = Array2::<Complex<f64>>::zeros((ph, pw));
    for ((i, j), &v) in kernel.indexed_iter() {
        let r = (i as isize - kr as isize).rem_euclid(ph as isize) as usize;
        let c = (j as isize - kc as isize).rem_euclid(pw as isize) as usize;
        wrapped[[r, c]] += Complex::new(v, 0.0);
    }

    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(pw);
    let fft_col = planner.plan_fft_forward(ph);
    let ifft_row = planner.plan_fft_inverse(pw);
    let ifft_col = planner.plan_fft_inverse(ph);

    let mut spectrum = padded.mapv(|v| Complex::new(v, 0.0));
    fft_axis(&mut spectrum, Axis(0), &fft_row);
    fft_axis(&mut spectrum, Axis(1), &fft_col);
    fft_axis(&mut wrapped, Axis(0), &fft_row);
    fft_axis(&mut wrapped, Axis(1), &fft_col);

    spectrum.zip_mut_with(&wrapped, |a, b| *a *= *b);

    fft_axis(&mut spectrum, Axis(1), &ifft_col);
    fft_axis(&mut spectrum, Axis(0), &ifft_row);

    let scale = 1.0 / (ph * pw) as f64;
    let mut result = Array2::<f64>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            result[[row, col]] = spectrum[[row + kr, col + kc]].re * scale;
        }
    }
    result
}

/// Run a 1D transform along every lane of `axis` (rows for `Axis(0)`).
fn fft_axis(data: &mut Array2<Complex<f64>>, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    let transform = |mut lane: ndarray::ArrayViewMut1<Complex<f64>>| {
        let mut buf = lane.to_vec();
        fft.process(&mut buf);
        for (dst, src) in lane.iter_mut().zip(buf) {
            *dst = src;
        }
    };

    if data.len() >= PARALLEL_PIXEL_THRESHOLD {
        data.axis_iter_mut(axis).into_par_iter().for_each(transform);
    } else {
        data.axis_iter_mut(axis).for_each(transform);
    }
}

/// Symmetric (edge-repeating) reflection of `i` into `[0, n)`.
fn reflect(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

pub(crate) fn mirror_pad(image: &Array2<f64>, pad_rows: usize, pad_cols: usize) -> Array2<f64> {
    let (h, w) = image.dim();
    Array2::from_shape_fn((h + 2 * pad_rows, w + 2 * pad_cols), |(r, c)| {
        let src_r = reflect(r as isize - pad_rows as isize, h);
        let src_c = reflect(c as isize - pad_cols as isize, w);
        image[[src_r, src_c]]
    })
}
