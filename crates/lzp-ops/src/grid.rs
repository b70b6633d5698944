//! Sparse-grid approximation of a window statistic.
//!
//! Instead of evaluating the statistic around every pixel, the plane is cut
//! into square blocks of side `g = 2 * half_size`. The statistic is computed
//! once over each block's own pixels (blocks at the right and bottom borders
//! are truncated), stored on grid node `(i, j)`, and the grid is upscaled
//! back to full resolution with [`upscale_nlinear`] at step `g`.
//!
//! Blocks are independent, so they are evaluated on the rayon pool with one
//! grid node written per task.

use crate::error::check_plane;
use crate::interp::upscale_nlinear;
use crate::stats::WindowStatistic;
use crate::OpsResult;
use rayon::prelude::*;
use tracing::{debug, trace};

/// Grid extent for a plane of `width x height` and block side `block`.
#[inline]
pub fn grid_dims(width: usize, height: usize, block: usize) -> (usize, usize) {
    (width.div_ceil(block), height.div_ceil(block))
}

/// Per-block statistic, one value per grid node, row-major.
pub fn block_statistic(
    src: &[f32],
    width: usize,
    height: usize,
    block: usize,
    stat: WindowStatistic,
) -> OpsResult<(Vec<f32>, usize, usize)> {
    check_plane(src, width, height)?;
    let block = block.max(1);
    let (gw, gh) = grid_dims(width, height, block);

    let grid = (0..gw * gh)
        .into_par_iter()
        .map(|node| {
            let (i, j) = (node % gw, node / gw);
            let (x0, y0) = (i * block, j * block);
            let (x1, y1) = ((x0 + block).min(width), (y0 + block).min(height));
            let values = (y0..y1).flat_map(move |y| src[y * width + x0..y * width + x1].iter().map(|&v| v as f64));
            stat.evaluate(values) as f32
        })
        .collect();

    Ok((grid, gw, gh))
}

/// Sparse-grid statistic of half-size `half_size`, upscaled to full size.
///
/// `half_size == 0` degenerates to one block per pixel.
pub fn sparse_statistic(
    src: &[f32],
    width: usize,
    height: usize,
    half_size: usize,
    stat: WindowStatistic,
) -> OpsResult<Vec<f32>> {
    trace!(width, height, half_size, ?stat, "sparse_statistic");
    if src.is_empty() {
        check_plane(src, width, height)?;
        return Ok(Vec::new());
    }
    let block = (2 * half_size).max(1);
    let (grid, gw, gh) = block_statistic(src, width, height, block, stat)?;
    debug!(gw, gh, block, "Upscaling sparse grid");
    upscale_nlinear(&grid, gw, gh, block as f64, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_dims() {
        assert_eq!(grid_dims(10, 7, 4), (3, 2));
        assert_eq!(grid_dims(8, 8, 4), (2, 2));
    }

    #[test]
    fn test_block_statistic_truncated_border() {
        // 3x1 plane, block 2: blocks [0,1] and [2].
        let src = vec![1.0f32, 3.0, 10.0];
        let (grid, gw, gh) = block_statistic(&src, 3, 1, 2, WindowStatistic::Mean).unwrap();
        assert_eq!((gw, gh), (2, 1));
        assert_eq!(grid, vec![2.0, 10.0]);

        let (var, _, _) = block_statistic(&src, 3, 1, 2, WindowStatistic::Variance).unwrap();
        assert_eq!(var, vec![1.0, 0.0]);
    }

    #[test]
    fn test_sparse_constant_plane() {
        let src = vec![7.0f32; 13 * 9];
        let mean = sparse_statistic(&src, 13, 9, 2, WindowStatistic::Mean).unwrap();
        let var = sparse_statistic(&src, 13, 9, 2, WindowStatistic::Variance).unwrap();
        assert!(mean.iter().all(|&v| (v - 7.0).abs() < 1e-6));
        assert!(var.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sparse_interpolates_between_nodes() {
        // Two 2x2 blocks with means 0 and 4 -> pixel 1 sits halfway.
        let src = vec![
            0.0f32, 0.0, 4.0, 4.0, //
            0.0, 0.0, 4.0, 4.0,
        ];
        let out = sparse_statistic(&src, 4, 2, 1, WindowStatistic::Mean).unwrap();
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 2.0);
        assert_relative_eq!(out[2], 4.0);
        assert_relative_eq!(out[3], 4.0);
    }
}
