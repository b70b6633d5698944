//! N-linear (bilinear) upscaling of a coarse grid.

use crate::{OpsError, OpsResult};
use rayon::prelude::*;
use tracing::trace;

/// Upscales a `grid_width x grid_height` grid to `width x height`.
///
/// Output pixel `p` samples the grid at continuous coordinate `p / step`
/// with bilinear interpolation. Beyond the last node the grid is border
/// extended, so trailing pixels hold the last node's value.
///
/// # Errors
///
/// - [`OpsError::InvalidParameter`] if `step` is not positive
/// - [`OpsError::InvalidDimensions`] if the grid is empty or its length is
///   not `grid_width * grid_height`
pub fn upscale_nlinear(
    grid: &[f32],
    grid_width: usize,
    grid_height: usize,
    step: f64,
    width: usize,
    height: usize,
) -> OpsResult<Vec<f32>> {
    trace!(grid_width, grid_height, step, width, height, "upscale_nlinear");
    if !(step > 0.0) {
        return Err(OpsError::InvalidParameter(format!(
            "grid step must be > 0, got {step}"
        )));
    }
    if grid.len() != grid_width * grid_height {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} grid nodes, got {}",
            grid_width * grid_height,
            grid.len()
        )));
    }
    if width * height == 0 {
        return Ok(Vec::new());
    }
    if grid.is_empty() {
        return Err(OpsError::InvalidDimensions("cannot upscale an empty grid".into()));
    }

    // Per-column node indices and weights are shared by every row.
    let columns: Vec<(usize, usize, f32)> = (0..width)
        .map(|x| node_pair(x, step, grid_width))
        .collect();

    let mut out = vec![0.0f32; width * height];
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let (y0, y1, fy) = node_pair(y, step, grid_height);
            let r0 = &grid[y0 * grid_width..(y0 + 1) * grid_width];
            let r1 = &grid[y1 * grid_width..(y1 + 1) * grid_width];
            for (v, &(x0, x1, fx)) in row.iter_mut().zip(&columns) {
                let top = r0[x0] + (r0[x1] - r0[x0]) * fx;
                let bottom = r1[x0] + (r1[x1] - r1[x0]) * fx;
                *v = top + (bottom - top) * fy;
            }
        });
    Ok(out)
}

/// Lower node, upper node and fractional weight for pixel `p`.
#[inline]
fn node_pair(p: usize, step: f64, nodes: usize) -> (usize, usize, f32) {
    let g = p as f64 / step;
    let i0 = g.floor() as usize;
    if i0 + 1 >= nodes {
        let last = nodes - 1;
        return (last, last, 0.0);
    }
    (i0, i0 + 1, (g - i0 as f64) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nodes_are_exact() {
        let grid = vec![0.0f32, 4.0, 8.0];
        let out = upscale_nlinear(&grid, 3, 1, 2.0, 5, 1).unwrap();
        assert_eq!(out, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_border_extension() {
        let grid = vec![1.0f32, 3.0];
        let out = upscale_nlinear(&grid, 2, 1, 2.0, 6, 1).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_bilinear_center() {
        let grid = vec![0.0f32, 1.0, 2.0, 3.0];
        let out = upscale_nlinear(&grid, 2, 2, 2.0, 3, 3).unwrap();
        assert_relative_eq!(out[4], 1.5);
        assert_relative_eq!(out[8], 3.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(upscale_nlinear(&[1.0], 1, 1, 0.0, 2, 2).is_err());
        assert!(upscale_nlinear(&[1.0], 2, 1, 1.0, 2, 2).is_err());
        assert!(upscale_nlinear(&[], 0, 0, 1.0, 2, 2).is_err());
    }
}
