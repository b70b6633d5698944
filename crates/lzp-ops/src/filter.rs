//! Gaussian smoothing and median filtering of single-channel planes.
//!
//! Both filters read outside the plane with border extension (clamped
//! coordinates). Rows are processed in parallel; vertical passes use a
//! transpose so that each worker owns whole rows.
//!
//! # Example
//!
//! ```rust
//! use lzp_ops::filter::{gaussian_blur, median};
//!
//! let src = vec![0.5f32; 16 * 16];
//! let blurred = gaussian_blur(&src, 16, 16, 1.5).unwrap();
//! assert!((blurred[0] - 0.5).abs() < 1e-6);
//!
//! let mut hm = vec![3u16; 9];
//! hm[4] = 40;
//! assert_eq!(median(&hm, 3, 3, 1).unwrap()[4], 3);
//! ```

use crate::error::check_plane;
use crate::{OpsError, OpsResult};
use lzp_core::Sample;
use rayon::prelude::*;
use tracing::{debug, trace};

/// Builds a normalized 1D gaussian kernel of radius `ceil(3 * sigma)`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil() as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel.into_iter().map(|k| k as f32).collect()
}

/// Gaussian blur with standard deviation `sigma` (in pixels).
///
/// `sigma == 0` returns a copy of the input.
///
/// # Errors
///
/// - [`OpsError::InvalidParameter`] if `sigma` is negative or not finite
/// - [`OpsError::InvalidDimensions`] if `src` is not `width * height` long
pub fn gaussian_blur(src: &[f32], width: usize, height: usize, sigma: f64) -> OpsResult<Vec<f32>> {
    trace!(width, height, sigma, "gaussian_blur");
    check_plane(src, width, height)?;
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(OpsError::InvalidParameter(format!(
            "gaussian sigma must be >= 0, got {sigma}"
        )));
    }
    if sigma == 0.0 || src.is_empty() {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel(sigma);
    debug!(width, height, taps = kernel.len(), "Applying gaussian blur");

    let temp = convolve_rows(src, width, height, &kernel);
    let transposed = transpose(&temp, width, height);
    let blurred = convolve_rows(&transposed, height, width, &kernel);
    Ok(transpose(&blurred, height, width))
}

/// Horizontal 1D convolution with clamped borders.
fn convolve_rows(src: &[f32], width: usize, height: usize, kernel: &[f32]) -> Vec<f32> {
    let radius = (kernel.len() / 2) as isize;
    let last = width as isize - 1;
    let mut dst = vec![0.0f32; width * height];

    dst.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * width..(y + 1) * width];
            for (x, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - radius).clamp(0, last) as usize;
                    acc += src_row[sx] * w;
                }
                *out = acc;
            }
        });

    dst
}

/// Transposes a single-channel plane: rows become columns.
///
/// Sample (x, y) at `y * width + x` moves to `x * height + y`.
pub fn transpose<T: Copy + Default + Send + Sync>(src: &[T], width: usize, height: usize) -> Vec<T> {
    let mut dst = vec![T::default(); width * height];
    if height == 0 {
        return dst;
    }
    dst.par_chunks_mut(height)
        .enumerate()
        .for_each(|(x, col)| {
            for (y, v) in col.iter_mut().enumerate() {
                *v = src[y * width + x];
            }
        });
    dst
}

/// Median filter over a square `(2 * radius + 1)^2` window.
///
/// `radius == 0` returns a copy of the input.
///
/// # Errors
///
/// Returns [`OpsError::InvalidDimensions`] if `src` is not `width * height`
/// long.
pub fn median<T: Sample>(src: &[T], width: usize, height: usize, radius: usize) -> OpsResult<Vec<T>> {
    trace!(width, height, radius, "median");
    check_plane(src, width, height)?;
    if radius == 0 || src.is_empty() {
        return Ok(src.to_vec());
    }

    let size = 2 * radius + 1;
    let count = size * size;
    let mid = count / 2;
    let (last_x, last_y) = (width as isize - 1, height as isize - 1);
    let mut dst = vec![T::zero(); width * height];

    dst.par_chunks_mut(width)
        .enumerate()
        .for_each_init(
            || Vec::with_capacity(count),
            |values, (y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    values.clear();
                    for ky in 0..size as isize {
                        let sy = (y as isize + ky - radius as isize).clamp(0, last_y) as usize;
                        for kx in 0..size as isize {
                            let sx = (x as isize + kx - radius as isize).clamp(0, last_x) as usize;
                            values.push(src[sy * width + sx]);
                        }
                    }
                    values.sort_by(|a: &T, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                    *out = values[mid];
                }
            },
        );

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_gaussian() {
        let k = gaussian_kernel(1.0);
        assert_eq!(k.len(), 7);

        // Sum should be 1.0
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);

        // Center should be highest
        assert!(k[3] > k[0]);
    }

    #[test]
    fn test_gaussian_constant() {
        let src = vec![0.5f32; 9 * 7];
        let result = gaussian_blur(&src, 9, 7, 2.0).unwrap();
        for v in result {
            assert!((v - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_gaussian_zero_sigma_is_copy() {
        let src: Vec<f32> = (0..12).map(|v| v as f32).collect();
        assert_eq!(gaussian_blur(&src, 4, 3, 0.0).unwrap(), src);
        assert!(gaussian_blur(&src, 4, 3, -1.0).is_err());
    }

    #[test]
    fn test_gaussian_spreads_impulse() {
        let mut src = vec![0.0f32; 11 * 11];
        src[5 * 11 + 5] = 1.0;
        let result = gaussian_blur(&src, 11, 11, 1.0).unwrap();
        let total: f32 = result.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert!(result[5 * 11 + 5] < 1.0);
        assert!(result[5 * 11 + 6] > 0.0);
        // Symmetric spread.
        assert!((result[5 * 11 + 4] - result[4 * 11 + 5]).abs() < 1e-6);
    }

    #[test]
    fn test_transpose() {
        let src = vec![1, 2, 3, 4, 5, 6];
        assert_eq!(transpose(&src, 3, 2), vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_median_noise() {
        // 3x3 patch with single outlier
        let mut src = vec![0.5f32; 9];
        src[4] = 10.0;

        let result = median(&src, 3, 3, 1).unwrap();
        assert!((result[4] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_median_border_extension() {
        // Corner sees itself 4 times in a clamped 3x3 window.
        let src: Vec<u16> = vec![
            9, 0, 0, //
            0, 0, 0, //
            0, 0, 0,
        ];
        let result = median(&src, 3, 3, 1).unwrap();
        assert_eq!(result[0], 0);
        let src = vec![9u16, 9, 0, 9, 9, 0, 0, 0, 0];
        assert_eq!(median(&src, 3, 3, 1).unwrap()[0], 9);
    }
}
