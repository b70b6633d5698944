//! Dense sliding-window mean and variance.
//!
//! Each output pixel summarizes the square window of side `2 * r + 1`
//! centred on it, with border extension: coordinates outside the plane are
//! clamped, so every window holds exactly `(2r + 1)^2` samples.
//!
//! Window sums of `x` and `x^2` are built with separable clamped running
//! sums in `f64`, as in a box blur, which keeps the cost independent of `r`
//! and avoids the cancellation error of `E[x^2] - E[x]^2` in `f32`.
//!
//! # Example
//!
//! ```rust
//! use lzp_ops::stats::{window_statistic, WindowStatistic};
//!
//! let src = vec![2.0f32; 8 * 8];
//! let var = window_statistic(&src, 8, 8, 2, WindowStatistic::Variance).unwrap();
//! assert!(var.iter().all(|&v| v == 0.0));
//! ```

use crate::error::check_plane;
use crate::filter::transpose;
use crate::OpsResult;
use rayon::prelude::*;
use tracing::trace;

/// Statistic computed over each window or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowStatistic {
    /// Arithmetic mean.
    Mean,
    /// Population variance.
    Variance,
}

impl WindowStatistic {
    /// Evaluates the statistic over a set of samples, in `f64`.
    ///
    /// Returns 0 for an empty set.
    pub fn evaluate<I: IntoIterator<Item = f64>>(self, values: I) -> f64 {
        let (mut n, mut s1, mut s2) = (0usize, 0.0f64, 0.0f64);
        for v in values {
            n += 1;
            s1 += v;
            s2 += v * v;
        }
        if n == 0 {
            return 0.0;
        }
        let mean = s1 / n as f64;
        match self {
            Self::Mean => mean,
            Self::Variance => (s2 / n as f64 - mean * mean).max(0.0),
        }
    }
}

/// Clamped running window sums of `x` and `x^2` along rows.
fn row_sums(src_x: &[f64], src_xx: &[f64], width: usize, height: usize, radius: usize) -> (Vec<f64>, Vec<f64>) {
    let mut sx = vec![0.0f64; width * height];
    let mut sxx = vec![0.0f64; width * height];
    let last = width as isize - 1;
    let r = radius as isize;

    sx.par_chunks_mut(width)
        .zip(sxx.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (row_x, row_xx))| {
            let in_x = &src_x[y * width..(y + 1) * width];
            let in_xx = &src_xx[y * width..(y + 1) * width];
            let at = |i: isize| i.clamp(0, last) as usize;

            let (mut a, mut b) = (0.0f64, 0.0f64);
            for k in -r..=r {
                a += in_x[at(k)];
                b += in_xx[at(k)];
            }
            for x in 0..width as isize {
                row_x[x as usize] = a;
                row_xx[x as usize] = b;
                let (leave, enter) = (at(x - r), at(x + r + 1));
                a += in_x[enter] - in_x[leave];
                b += in_xx[enter] - in_xx[leave];
            }
        });

    (sx, sxx)
}

/// Window sums of `x` and `x^2` over the clamped `(2r+1)^2` neighbourhood.
fn window_sums(src: &[f32], width: usize, height: usize, radius: usize) -> (Vec<f64>, Vec<f64>) {
    let x: Vec<f64> = src.par_iter().map(|&v| v as f64).collect();
    let xx: Vec<f64> = x.par_iter().map(|&v| v * v).collect();

    let (hx, hxx) = row_sums(&x, &xx, width, height, radius);
    let (tx, txx) = (transpose(&hx, width, height), transpose(&hxx, width, height));
    let (vx, vxx) = row_sums(&tx, &txx, height, width, radius);
    (transpose(&vx, height, width), transpose(&vxx, height, width))
}

/// Dense window statistic of half-size `radius`.
///
/// # Errors
///
/// Returns [`OpsError::InvalidDimensions`](crate::OpsError::InvalidDimensions)
/// if `src` is not `width * height` long.
pub fn window_statistic(
    src: &[f32],
    width: usize,
    height: usize,
    radius: usize,
    stat: WindowStatistic,
) -> OpsResult<Vec<f32>> {
    trace!(width, height, radius, ?stat, "window_statistic");
    check_plane(src, width, height)?;
    if src.is_empty() {
        return Ok(Vec::new());
    }

    let (sx, sxx) = window_sums(src, width, height, radius);
    let side = (2 * radius + 1) as f64;
    let inv_n = 1.0 / (side * side);

    let out = sx
        .par_iter()
        .zip(sxx.par_iter())
        .map(|(&a, &b)| {
            let mean = a * inv_n;
            match stat {
                WindowStatistic::Mean => mean as f32,
                WindowStatistic::Variance => (b * inv_n - mean * mean).max(0.0) as f32,
            }
        })
        .collect();
    Ok(out)
}

/// Dense window mean. See [`window_statistic`].
pub fn window_mean(src: &[f32], width: usize, height: usize, radius: usize) -> OpsResult<Vec<f32>> {
    window_statistic(src, width, height, radius, WindowStatistic::Mean)
}

/// Dense window population variance. See [`window_statistic`].
pub fn window_variance(src: &[f32], width: usize, height: usize, radius: usize) -> OpsResult<Vec<f32>> {
    window_statistic(src, width, height, radius, WindowStatistic::Variance)
}
