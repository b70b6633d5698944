//! Integer-factor binning and nearest-neighbour unbinning.
//!
//! Binning reduces origin-anchored blocks of `factor` samples per axis to one
//! sample. Output extents use floor division, so trailing remainder samples
//! that do not fill a whole block are dropped rather than padded.
//!
//! Unbinning is the inverse resampling: every target sample reads the binned
//! sample `p / factor`, clamped to the binned extent. Target samples in the
//! dropped remainder therefore receive the border value.
//!
//! Both operations work on any rank with axes in memory order (X fastest).
//! [`bin_plane`] and [`unbin_plane`] are the 2D shortcuts used per Z-plane.
//!
//! # Example
//!
//! ```rust
//! use lzp_ops::bin::{bin_plane, unbin_plane, Reducer};
//!
//! let src: Vec<u16> = vec![
//!     1, 3, 9,
//!     5, 7, 9,
//! ];
//! let (binned, bw, bh) = bin_plane(&src, 3, 2, 2, Reducer::Mean).unwrap();
//! assert_eq!((bw, bh), (1, 1));
//! assert_eq!(binned, vec![4]);
//!
//! let back = unbin_plane(&binned, bw, bh, 2, 3, 2).unwrap();
//! assert_eq!(back, vec![4; 6]);
//! ```

use crate::{OpsError, OpsResult};
use lzp_core::Sample;
use rayon::prelude::*;
use tracing::trace;

/// Block reduction applied when binning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Reducer {
    /// Arithmetic mean, rounded for integer samples.
    #[default]
    Mean,
    /// Sum, saturated to the sample range.
    Sum,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
}

fn check_factors(dims: &[usize], factors: &[usize]) -> OpsResult<()> {
    if factors.len() != dims.len() {
        return Err(OpsError::InvalidParameter(format!(
            "expected {} binning factors, got {}",
            dims.len(),
            factors.len()
        )));
    }
    if let Some(d) = factors.iter().position(|&f| f == 0) {
        return Err(OpsError::InvalidParameter(format!(
            "binning factor for axis {d} must be >= 1"
        )));
    }
    Ok(())
}

fn check_len<T>(src: &[T], dims: &[usize]) -> OpsResult<()> {
    let expected: usize = dims.iter().product();
    if src.len() != expected {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} samples for dims {:?}, got {}",
            expected,
            dims,
            src.len()
        )));
    }
    Ok(())
}

/// Splits a linear index into coordinates, X fastest.
#[inline]
fn unravel(mut index: usize, dims: &[usize], coords: &mut [usize]) {
    for (c, &d) in coords.iter_mut().zip(dims) {
        *c = index % d;
        index /= d;
    }
}

/// Joins coordinates into a linear index, X fastest.
#[inline]
fn ravel(coords: &[usize], dims: &[usize]) -> usize {
    coords
        .iter()
        .zip(dims)
        .rev()
        .fold(0, |acc, (&c, &d)| acc * d + c)
}

/// Bins an N-dimensional buffer.
///
/// Returns the binned samples and their extents, `dims[d] / factors[d]`.
///
/// # Errors
///
/// - [`OpsError::InvalidParameter`] if `factors.len() != dims.len()` or any
///   factor is zero
/// - [`OpsError::InvalidDimensions`] if `src` does not hold `dims` samples
pub fn bin<T: Sample>(
    src: &[T],
    dims: &[usize],
    factors: &[usize],
    reducer: Reducer,
) -> OpsResult<(Vec<T>, Vec<usize>)> {
    trace!(?dims, ?factors, ?reducer, "bin");
    check_factors(dims, factors)?;
    check_len(src, dims)?;

    let out_dims: Vec<usize> = dims.iter().zip(factors).map(|(d, f)| d / f).collect();
    let out_len: usize = out_dims.iter().product();
    let block_len: usize = factors.iter().product();
    let rank = dims.len();

    let out = (0..out_len)
        .into_par_iter()
        .map_init(
            || (vec![0usize; rank], vec![0usize; rank], vec![0usize; rank]),
            |(out_pos, block_pos, src_pos), i| {
                unravel(i, &out_dims, out_pos);
                let mut acc = match reducer {
                    Reducer::Mean | Reducer::Sum => 0.0,
                    Reducer::Min => f64::INFINITY,
                    Reducer::Max => f64::NEG_INFINITY,
                };
                for k in 0..block_len {
                    unravel(k, factors, block_pos);
                    for d in 0..rank {
                        src_pos[d] = out_pos[d] * factors[d] + block_pos[d];
                    }
                    let v = src[ravel(src_pos, dims)].to_f64();
                    acc = match reducer {
                        Reducer::Mean | Reducer::Sum => acc + v,
                        Reducer::Min => acc.min(v),
                        Reducer::Max => acc.max(v),
                    };
                }
                if reducer == Reducer::Mean {
                    acc /= block_len as f64;
                }
                T::from_f64(acc)
            },
        )
        .collect();

    Ok((out, out_dims))
}

/// Unbins an N-dimensional buffer to `target_dims` by nearest-neighbour,
/// border-extended reads.
///
/// # Errors
///
/// - [`OpsError::InvalidParameter`] on bad factors or a target rank that
///   differs from the binned rank
/// - [`OpsError::InvalidDimensions`] if `binned` is empty while the target is
///   not, or its length does not match `binned_dims`
pub fn unbin<T: Copy + Send + Sync>(
    binned: &[T],
    binned_dims: &[usize],
    factors: &[usize],
    target_dims: &[usize],
) -> OpsResult<Vec<T>> {
    trace!(?binned_dims, ?factors, ?target_dims, "unbin");
    check_factors(binned_dims, factors)?;
    check_len(binned, binned_dims)?;
    if target_dims.len() != binned_dims.len() {
        return Err(OpsError::InvalidParameter(format!(
            "target rank {} differs from binned rank {}",
            target_dims.len(),
            binned_dims.len()
        )));
    }
    let out_len: usize = target_dims.iter().product();
    if out_len > 0 && binned.is_empty() {
        return Err(OpsError::InvalidDimensions(
            "cannot unbin an empty buffer".into(),
        ));
    }
    let rank = target_dims.len();

    let out = (0..out_len)
        .into_par_iter()
        .map_init(
            || (vec![0usize; rank], vec![0usize; rank]),
            |(pos, src_pos), i| {
                unravel(i, target_dims, pos);
                for d in 0..rank {
                    src_pos[d] = (pos[d] / factors[d]).min(binned_dims[d] - 1);
                }
                binned[ravel(src_pos, binned_dims)]
            },
        )
        .collect();

    Ok(out)
}

/// Bins a 2D plane by the same factor on both axes.
///
/// Returns the binned plane with its width and height.
pub fn bin_plane<T: Sample>(
    src: &[T],
    width: usize,
    height: usize,
    factor: usize,
    reducer: Reducer,
) -> OpsResult<(Vec<T>, usize, usize)> {
    if factor == 1 {
        check_len(src, &[width, height])?;
        return Ok((src.to_vec(), width, height));
    }
    let (out, dims) = bin(src, &[width, height], &[factor, factor], reducer)?;
    Ok((out, dims[0], dims[1]))
}

/// Unbins a 2D plane to `target_width x target_height`.
pub fn unbin_plane<T: Copy + Send + Sync>(
    binned: &[T],
    width: usize,
    height: usize,
    factor: usize,
    target_width: usize,
    target_height: usize,
) -> OpsResult<Vec<T>> {
    if factor == 0 {
        return Err(OpsError::InvalidParameter(
            "binning factor must be >= 1".into(),
        ));
    }
    check_len(binned, &[width, height])?;
    if factor == 1 && (width, height) == (target_width, target_height) {
        return Ok(binned.to_vec());
    }
    let n = target_width * target_height;
    if n == 0 {
        return Ok(Vec::new());
    }
    if binned.is_empty() {
        return Err(OpsError::InvalidDimensions(
            "cannot unbin an empty plane".into(),
        ));
    }

    let mut out = vec![binned[0]; n];
    out.par_chunks_mut(target_width)
        .enumerate()
        .for_each(|(y, row)| {
            let by = (y / factor).min(height - 1);
            let src_row = &binned[by * width..(by + 1) * width];
            for (x, v) in row.iter_mut().enumerate() {
                *v = src_row[(x / factor).min(width - 1)];
            }
        });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_floor_division() {
        // 5x3 plane, factor 2 -> 2x1, last column and row dropped.
        let src: Vec<u8> = (0..15).collect();
        let (out, w, h) = bin_plane(&src, 5, 3, 2, Reducer::Mean).unwrap();
        assert_eq!((w, h), (2, 1));
        // (0+1+5+6)/4 = 3, (2+3+7+8)/4 = 5
        assert_eq!(out, vec![3, 5]);
    }

    #[test]
    fn test_bin_reducers() {
        let src: Vec<f32> = vec![1.0, 2.0, 3.0, 6.0];
        let dims = [2, 2];
        let f = [2, 2];
        assert_eq!(bin(&src, &dims, &f, Reducer::Sum).unwrap().0, vec![12.0]);
        assert_eq!(bin(&src, &dims, &f, Reducer::Min).unwrap().0, vec![1.0]);
        assert_eq!(bin(&src, &dims, &f, Reducer::Max).unwrap().0, vec![6.0]);
        assert_eq!(bin(&src, &dims, &f, Reducer::Mean).unwrap().0, vec![3.0]);
    }

    #[test]
    fn test_bin_sum_saturates() {
        let src = vec![200u8; 4];
        let (out, _) = bin(&src, &[2, 2], &[2, 2], Reducer::Sum).unwrap();
        assert_eq!(out, vec![255]);
    }

    #[test]
    fn test_bin_3d_per_axis_factors() {
        // 4x2x2 volume, bin X by 2 only.
        let src: Vec<f64> = (0..16).map(|v| v as f64).collect();
        let (out, dims) = bin(&src, &[4, 2, 2], &[2, 1, 1], Reducer::Mean).unwrap();
        assert_eq!(dims, vec![2, 2, 2]);
        assert_eq!(out[0], 0.5);
        assert_eq!(out[7], 14.5);
    }

    #[test]
    fn test_bin_rejects_bad_factors() {
        let src = vec![0u8; 4];
        assert!(bin(&src, &[2, 2], &[2], Reducer::Mean).is_err());
        assert!(bin(&src, &[2, 2], &[0, 1], Reducer::Mean).is_err());
        assert!(bin_plane(&src, 2, 3, 2, Reducer::Mean).is_err());
    }

    #[test]
    fn test_unbin_border_extension() {
        let binned = vec![1u16, 2];
        let out = unbin_plane(&binned, 2, 1, 2, 5, 3).unwrap();
        assert_eq!(
            out,
            vec![
                1, 1, 2, 2, 2, //
                1, 1, 2, 2, 2, //
                1, 1, 2, 2, 2,
            ]
        );
        let nd = unbin(&binned, &[2, 1], &[2, 2], &[5, 3]).unwrap();
        assert_eq!(nd, out);
    }

    #[test]
    fn test_unbin_identity_factor_one() {
        let src: Vec<u16> = (0..12).collect();
        assert_eq!(unbin_plane(&src, 4, 3, 1, 4, 3).unwrap(), src);
        assert_eq!(unbin(&src, &[4, 3], &[1, 1], &[4, 3]).unwrap(), src);
    }

    #[test]
    fn test_bin_unbin_block_constant() {
        // Exact multiple: unbin(bin(img)) is the block-mean image.
        let src: Vec<f32> = vec![
            0.0, 2.0, 10.0, 10.0, //
            2.0, 4.0, 10.0, 10.0,
        ];
        let (b, bw, bh) = bin_plane(&src, 4, 2, 2, Reducer::Mean).unwrap();
        let back = unbin_plane(&b, bw, bh, 2, 4, 2).unwrap();
        assert_eq!(back, vec![2.0, 2.0, 10.0, 10.0, 2.0, 2.0, 10.0, 10.0]);
    }

    #[test]
    fn test_unbin_empty_source() {
        let empty: Vec<u8> = Vec::new();
        assert!(unbin_plane(&empty, 0, 0, 2, 4, 4).is_err());
    }
}
