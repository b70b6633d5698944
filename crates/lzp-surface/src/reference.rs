//! Height-map (reference surface) estimation.
//!
//! For every Z plane in the configured range the plane is mean-binned,
//! optionally gaussian-smoothed, and turned into a focus response by the
//! configured window statistic. Each binned pixel keeps the Z of its
//! strongest response; ties keep the earliest Z. The binned map is then
//! optionally median-filtered and unbinned back to full resolution.
//!
//! # Example
//!
//! ```rust
//! use lzp_core::{Shape, Volume};
//! use lzp_surface::params::{ReferenceSurfaceParameters, SurfaceMethod};
//! use lzp_surface::reference::ReferenceSurface;
//!
//! // Plane 3 carries a texture, the others are flat.
//! let stack = Volume::from_fn(Shape::stack(16, 16, 6), |x, y, z, _, _| {
//!     if z == 3 && (x + y) % 2 == 0 { 200u16 } else { 100 }
//! });
//! let params = ReferenceSurfaceParameters::builder()
//!     .method(SurfaceMethod::MaxOfVariance)
//!     .filter_window_size(3)
//!     .build()
//!     .unwrap();
//! let hm = ReferenceSurface::new(params).estimate(&stack).unwrap();
//! assert_eq!(hm.min_max(), Some((3, 3)));
//! ```

use crate::params::ReferenceSurfaceParameters;
use crate::{SurfaceError, SurfaceResult};
use lzp_core::{CancelToken, Error as CoreError, HeightMap, Sample, Shape, Stack, plane_to_f32};
use lzp_ops::{Reducer, bin_plane, gaussian_blur, median, sparse_statistic, unbin_plane, window_statistic};
use rayon::prelude::*;
use tracing::{debug, trace};

/// Focus response of one plane at binned resolution.
pub(crate) struct Response {
    pub values: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

/// Bins, smooths and filters one full-resolution plane.
pub(crate) fn plane_response<T: Sample>(
    plane: &[T],
    width: usize,
    height: usize,
    params: &ReferenceSurfaceParameters,
) -> SurfaceResult<Response> {
    let work = plane_to_f32(plane);
    let (binned, bw, bh) = bin_plane(&work, width, height, params.binning() as usize, Reducer::Mean)?;
    let smoothed = if params.sigma() > 0.0 {
        gaussian_blur(&binned, bw, bh, params.sigma())?
    } else {
        binned
    };

    let half = params.filter_half_size();
    let stat = params.method().statistic();
    let values = if params.method().is_sparse() {
        sparse_statistic(&smoothed, bw, bh, half, stat)?
    } else {
        window_statistic(&smoothed, bw, bh, half, stat)?
    };
    Ok(Response {
        values,
        width: bw,
        height: bh,
    })
}

/// Binned extent for a plane, rejecting binning larger than the plane.
pub(crate) fn binned_extent(shape: &Shape, binning: u32) -> SurfaceResult<(usize, usize)> {
    let b = binning as usize;
    let (bw, bh) = (shape.width / b, shape.height / b);
    if bw == 0 || bh == 0 {
        return Err(SurfaceError::invalid(format!(
            "binning {} leaves no pixel of a {}x{} plane",
            binning, shape.width, shape.height
        )));
    }
    Ok((bw, bh))
}

/// Checks for a single-channel 3D stack whose Z indices fit in a height map.
pub(crate) fn check_single_channel(shape: &Shape) -> SurfaceResult<usize> {
    let depth = match (shape.depth, shape.rank()) {
        (Some(d), 3) => d,
        _ => return Err(CoreError::rank_mismatch("source", 3, shape.rank()).into()),
    };
    if depth == 0 {
        return Err(SurfaceError::invalid(format!("source {shape} has no Z planes")));
    }
    if depth > u16::MAX as usize + 1 {
        return Err(SurfaceError::invalid(format!(
            "stack depth {depth} exceeds the height-map range"
        )));
    }
    Ok(depth)
}

/// Updates the running maximum with `response` at plane `z`.
///
/// Returns one flag per binned pixel telling whether `z` became its winner.
pub(crate) fn update_max(
    response: &Response,
    z: u16,
    running_max: &mut [f64],
    binned_map: &mut [u16],
) -> Vec<bool> {
    let w = response.width;
    let mut won = vec![false; running_max.len()];
    running_max
        .par_chunks_mut(w)
        .zip(binned_map.par_chunks_mut(w))
        .zip(won.par_chunks_mut(w))
        .enumerate()
        .for_each(|(y, ((max_row, map_row), won_row))| {
            let resp_row = &response.values[y * w..(y + 1) * w];
            for x in 0..w {
                let r = resp_row[x] as f64;
                if r > max_row[x] {
                    max_row[x] = r;
                    map_row[x] = z;
                    won_row[x] = true;
                }
            }
        });
    won
}

/// Height-map estimator for a single-channel 3D stack.
#[derive(Debug, Clone)]
pub struct ReferenceSurface {
    params: ReferenceSurfaceParameters,
    cancel: CancelToken,
}

impl ReferenceSurface {
    /// Creates an estimator with its own cancel token.
    pub fn new(params: ReferenceSurfaceParameters) -> Self {
        Self {
            params,
            cancel: CancelToken::new(),
        }
    }

    /// Shares `token` for cancellation.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Estimation parameters.
    pub fn params(&self) -> &ReferenceSurfaceParameters {
        &self.params
    }

    /// Cancel token polled between Z planes.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Estimates the full-resolution height map of `stack`.
    ///
    /// When canceled mid-sweep, the map built so far is unbinned and
    /// returned without median filtering. An empty Z range yields an
    /// all-zero map.
    ///
    /// # Errors
    ///
    /// - rank mismatch if `stack` is not a single-channel 3D stack
    /// - [`SurfaceError::InvalidArgument`] if binning leaves no pixel
    pub fn estimate<T: Sample, S: Stack<T> + ?Sized>(&self, stack: &S) -> SurfaceResult<HeightMap> {
        let shape = stack.shape();
        let depth = check_single_channel(&shape)?;
        let (width, height) = shape.xy();
        let b = self.params.binning() as usize;
        let (bw, bh) = binned_extent(&shape, self.params.binning())?;
        trace!(%shape, binning = b, method = %self.params.method(), "ReferenceSurface::estimate");

        let Some(range) = self.params.z_range(depth) else {
            debug!(depth, z_min = self.params.z_min(), z_max = self.params.z_max(), "Empty Z range");
            return Ok(HeightMap::new(width, height));
        };

        let mut binned_map = vec![0u16; bw * bh];
        let mut running_max = vec![f64::NEG_INFINITY; bw * bh];

        for z in range {
            if self.cancel.is_canceled() {
                debug!(z, "Height-map estimation canceled");
                break;
            }
            let plane = stack.read_plane(0, z)?;
            let response = plane_response(&plane, width, height, &self.params)?;
            update_max(&response, z as u16, &mut running_max, &mut binned_map);
            trace!(z, "Plane scanned");
        }

        let half = self.params.median_half_size() as usize;
        if half > 0 && !self.cancel.is_canceled() {
            binned_map = median(&binned_map, bw, bh, half)?;
        }

        let full = unbin_plane(&binned_map, bw, bh, b, width, height)?;
        Ok(HeightMap::from_data(width, height, full)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SurfaceMethod;
    use lzp_core::Volume;

    /// Checkerboard whose contrast peaks at `focus`.
    fn focus_stack(w: usize, h: usize, d: usize, focus: usize) -> Volume<u16> {
        Volume::from_fn(Shape::stack(w, h, d), |x, y, z, _, _| {
            let amp = 50.0 * (-((z as f64 - focus as f64).powi(2)) / 8.0).exp();
            let checker = ((x / 2 + y / 2) % 2) as f64;
            (100.0 + amp * checker).round() as u16
        })
    }

    fn params(method: SurfaceMethod) -> ReferenceSurfaceParameters {
        ReferenceSurfaceParameters::builder()
            .method(method)
            .filter_window_size(5)
            .build()
            .unwrap()
    }

    #[test]
    fn test_unambiguous_focus_dense() {
        let stack = focus_stack(24, 20, 12, 7);
        let hm = ReferenceSurface::new(params(SurfaceMethod::MaxOfVariance))
            .estimate(&stack)
            .unwrap();
        assert_eq!((hm.width(), hm.height()), (24, 20));
        assert_eq!(hm.min_max(), Some((7, 7)));
    }

    #[test]
    fn test_unambiguous_focus_sparse() {
        let stack = focus_stack(36, 36, 10, 4);
        let hm = ReferenceSurface::new(params(SurfaceMethod::SparseMaxOfVariance))
            .estimate(&stack)
            .unwrap();
        assert_eq!(hm.min_max(), Some((4, 4)));
    }

    #[test]
    fn test_max_of_mean_follows_brightest_plane() {
        let stack = Volume::from_fn(Shape::stack(8, 8, 5), |_, _, z, _, _| if z == 2 { 9.0f32 } else { 1.0 });
        let hm = ReferenceSurface::new(params(SurfaceMethod::MaxOfMean))
            .estimate(&stack)
            .unwrap();
        assert!(hm.data().iter().all(|&z| z == 2));
    }

    #[test]
    fn test_ties_keep_earliest_z() {
        let stack: Volume<u8> = Volume::new(Shape::stack(6, 6, 4));
        let p = ReferenceSurfaceParameters::builder().z_min(1).build().unwrap();
        let hm = ReferenceSurface::new(p).estimate(&stack).unwrap();
        assert!(hm.data().iter().all(|&z| z == 1));
    }

    #[test]
    fn test_binning_unbins_with_border() {
        // 10x9 plane, binning 4 -> 2x2 binned; remainder pixels take border values.
        let stack = focus_stack(10, 9, 8, 5);
        let p = ReferenceSurfaceParameters::builder()
            .binning(4)
            .filter_window_size(4)
            .method(SurfaceMethod::MaxOfMean)
            .build()
            .unwrap();
        let hm = ReferenceSurface::new(p).estimate(&stack).unwrap();
        assert_eq!((hm.width(), hm.height()), (10, 9));
        assert_eq!(hm.get(9, 8), hm.get(7, 7));
    }

    #[test]
    fn test_z_range_bounds_result() {
        let stack = focus_stack(16, 16, 12, 8);
        let p = ReferenceSurfaceParameters::builder()
            .method(SurfaceMethod::MaxOfVariance)
            .filter_window_size(5)
            .z_min(2)
            .z_max(5)
            .build()
            .unwrap();
        let hm = ReferenceSurface::new(p).estimate(&stack).unwrap();
        let (lo, hi) = hm.min_max().unwrap();
        assert!(lo >= 2 && hi <= 5);
        assert_eq!(hi, 5);
    }

    #[test]
    fn test_empty_range_gives_zero_map() {
        let stack = focus_stack(8, 8, 4, 2);
        let p = ReferenceSurfaceParameters::builder().z_min(10).z_max(20).build().unwrap();
        let hm = ReferenceSurface::new(p).estimate(&stack).unwrap();
        assert_eq!(hm, HeightMap::new(8, 8));
    }

    #[test]
    fn test_rejects_bad_input() {
        let multi: Volume<u8> = Volume::new(Shape::stack(4, 4, 2).with_channels(2));
        assert!(ReferenceSurface::new(params(SurfaceMethod::MaxOfMean)).estimate(&multi).is_err());

        let flat: Volume<u8> = Volume::new(Shape::stack(4, 4, 0));
        assert!(matches!(
            ReferenceSurface::new(params(SurfaceMethod::MaxOfMean)).estimate(&flat),
            Err(SurfaceError::InvalidArgument(_))
        ));

        let small: Volume<u8> = Volume::new(Shape::stack(4, 4, 2));
        let p = ReferenceSurfaceParameters::builder().binning(5).build().unwrap();
        assert!(matches!(
            ReferenceSurface::new(p).estimate(&small),
            Err(SurfaceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_canceled_before_start() {
        let stack = focus_stack(8, 8, 6, 3);
        let est = ReferenceSurface::new(params(SurfaceMethod::MaxOfVariance));
        est.cancel_token().cancel("stop");
        let hm = est.estimate(&stack).unwrap();
        assert_eq!(hm, HeightMap::new(8, 8));
    }

    #[test]
    fn test_median_removes_outlier() {
        // Signal at z=1 everywhere except a 3x3 block that peaks at z=3.
        let stack = Volume::from_fn(Shape::stack(12, 12, 4), |x, y, z, _, _| {
            let hot = (4..7).contains(&x) && (4..7).contains(&y);
            let focus = if hot { 3 } else { 1 };
            if z == focus { 10.0f32 } else { 0.0 }
        });
        let base = ReferenceSurfaceParameters::builder()
            .method(SurfaceMethod::MaxOfMean)
            .filter_window_size(1);
        let raw = ReferenceSurface::new(base.clone().build().unwrap()).estimate(&stack).unwrap();
        assert_eq!(raw.get(5, 5), Some(3));
        let filtered = ReferenceSurface::new(base.median_post_filter_half_size(2).build().unwrap())
            .estimate(&stack)
            .unwrap();
        assert_eq!(filtered.min_max(), Some((1, 1)));
    }
}
