//! Single-sweep variants for stacks whose plane reads are expensive.
//!
//! Both variants scan Z in the outer loop so every source plane is read at
//! most once per channel:
//!
//! - [`extract_streaming`] projects around a known height map and matches
//!   [`SurfaceProjector`](crate::project::SurfaceProjector) wherever the
//!   windows lie inside the stack.
//! - [`FusedProjector`] estimates the height map and its MIP in the same
//!   sweep, keeping the last `delta_z` planes in a ring so a pixel whose
//!   winner moves can rebuild its window without re-reading.

use crate::params::{ExtractSurfaceParameters, ProjectionMethod, ReferenceSurfaceParameters};
use crate::project::{check_time_point, window};
use crate::reference::{binned_extent, check_single_channel, plane_response, update_max};
use crate::{SurfaceError, SurfaceResult};
use lzp_core::{CancelToken, ChannelOf, HeightMap, Sample, Shape, Stack, Volume};
use lzp_ops::unbin_plane;
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Projects `stack` around `height_map` in one ascending Z sweep per channel.
///
/// Output is one plane per channel (channel axis kept if present). A pixel
/// accumulates plane `z` only when `z` lies in its unclamped window, so
/// pixels whose window misses the stack entirely stay zero.
///
/// On cancellation the channel in flight keeps what it accumulated and later
/// channels stay zero.
///
/// # Errors
///
/// - [`SurfaceError::InvalidArgument`] if any channel uses
///   [`ProjectionMethod::Collect`], or for a time axis or missing Z axis
/// - dimension mismatch if the height map extent differs from the stack
pub fn extract_streaming<T: Sample, S: Stack<T> + ?Sized>(
    stack: &S,
    height_map: &HeightMap,
    params: &ExtractSurfaceParameters,
    cancel: &CancelToken,
) -> SurfaceResult<Volume<T>> {
    let shape = stack.shape();
    let (depth, channels) = check_time_point(&shape)?;
    let (w, h) = shape.xy();
    height_map.check_extent(w, h)?;
    if let Some(c) = (0..channels).find(|&c| params.projection_method(c) == ProjectionMethod::Collect) {
        return Err(SurfaceError::invalid(format!(
            "streaming extraction cannot collect (channel {c})"
        )));
    }
    trace!(%shape, "extract_streaming");

    let out_shape = match shape.channels {
        Some(c) => Shape::plane(w, h).with_channels(c),
        None => Shape::plane(w, h),
    };
    let mut out = Volume::<T>::new(out_shape);
    let Some((lo, hi)) = height_map.min_max() else {
        return Ok(out);
    };
    let heights = height_map.data();
    let plane_len = w * h;

    'channels: for (c, plane_out) in out.data_mut().chunks_mut(plane_len).enumerate() {
        if cancel.is_canceled() {
            break;
        }
        let method = params.projection_method(c);
        let (offset, dz) = (params.offset(c), params.delta_z(c));
        let first = window(lo, offset, dz).0.max(0);
        let last = window(hi, offset, dz).1.min(depth as i64 - 1);
        debug!(c, %method, first, last, "Streaming channel");

        let mut sums = vec![0.0f64; plane_len];
        let mut counts = vec![0u32; plane_len];
        for z in first..=last {
            if cancel.is_canceled() {
                finish(method, &sums, &counts, plane_out);
                break 'channels;
            }
            let plane = stack.read_plane(c, z as usize)?;
            plane_out
                .par_chunks_mut(w)
                .zip(sums.par_chunks_mut(w))
                .zip(counts.par_chunks_mut(w))
                .enumerate()
                .for_each(|(y, ((row, sum_row), count_row))| {
                    for x in 0..w {
                        let i = y * w + x;
                        let (a, b) = window(heights[i], offset, dz);
                        if z < a || z > b {
                            continue;
                        }
                        let s = plane[i];
                        if method == ProjectionMethod::Mean {
                            sum_row[x] += s.to_f64();
                        } else if count_row[x] == 0 {
                            row[x] = s;
                        } else {
                            row[x] = row[x].max_of(s);
                        }
                        count_row[x] += 1;
                    }
                });
        }
        finish(method, &sums, &counts, plane_out);
    }
    Ok(out)
}

/// Turns mean accumulators into samples; MIP planes are already final.
fn finish<T: Sample>(method: ProjectionMethod, sums: &[f64], counts: &[u32], out: &mut [T]) {
    if method != ProjectionMethod::Mean {
        return;
    }
    out.par_iter_mut()
        .zip(sums.par_iter().zip(counts.par_iter()))
        .for_each(|(v, (&s, &n))| {
            if n > 0 {
                *v = T::from_f64(s / n as f64);
            }
        });
}

/// Fused height-map estimation and MIP extraction on the target channel.
///
/// Planes are read once over `[z_min - delta_z, z_max + delta_z]` and the
/// focus response is evaluated on `[z_min, z_max]`. Each full-resolution
/// pixel follows the winner of the binned pixel that covers it, so the
/// result equals [`ReferenceSurface::estimate`](crate::reference::ReferenceSurface::estimate)
/// followed by a MIP projection with the same `delta_z` and no offset.
///
/// A median post-filter would move winners after the sweep, so parameters
/// with one are rejected.
#[derive(Debug, Clone)]
pub struct FusedProjector {
    reference: ReferenceSurfaceParameters,
    delta_z: u32,
    cancel: CancelToken,
}

impl FusedProjector {
    /// Creates a fused projector.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::InvalidArgument`] if `reference` enables the median
    /// post-filter.
    pub fn new(reference: ReferenceSurfaceParameters, delta_z: u32) -> SurfaceResult<Self> {
        if reference.median_half_size() > 0 {
            return Err(SurfaceError::invalid(format!(
                "one-pass projection does not support a median post-filter (half-size {})",
                reference.median_half_size()
            )));
        }
        Ok(Self {
            reference,
            delta_z,
            cancel: CancelToken::new(),
        })
    }

    /// Shares `token` for cancellation.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Cancel token polled between Z planes.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Estimation parameters.
    pub fn reference(&self) -> &ReferenceSurfaceParameters {
        &self.reference
    }

    /// MIP half-range.
    pub fn delta_z(&self) -> u32 {
        self.delta_z
    }

    /// Runs the sweep, returning the MIP plane and the height map.
    pub fn project<T: Sample, S: Stack<T> + ?Sized>(&self, stack: &S) -> SurfaceResult<(Volume<T>, HeightMap)> {
        let (w, h) = stack.shape().xy();
        let mut out = Volume::new(Shape::plane(w, h));
        let hm = self.project_into(stack, out.data_mut())?;
        Ok((out, hm))
    }

    /// Runs the sweep into `out` (one full-resolution plane) and returns the
    /// height map.
    ///
    /// The target channel is selected when `stack` has a channel axis.
    pub fn project_into<T: Sample, S: Stack<T> + ?Sized>(&self, stack: &S, out: &mut [T]) -> SurfaceResult<HeightMap> {
        let shape = stack.shape();
        check_time_point(&shape)?;
        if shape.channels.is_some() {
            let target = ChannelOf::new::<T>(stack, self.reference.target_channel())?;
            self.sweep(&target, out)
        } else {
            self.sweep(stack, out)
        }
    }

    fn sweep<T: Sample, S: Stack<T> + ?Sized>(&self, stack: &S, out: &mut [T]) -> SurfaceResult<HeightMap> {
        let shape = stack.shape();
        let depth = check_single_channel(&shape)?;
        let (w, h) = shape.xy();
        if out.len() != w * h {
            return Err(lzp_core::Error::BufferLength {
                expected: w * h,
                got: out.len(),
            }
            .into());
        }
        let b = self.reference.binning() as usize;
        let (bw, bh) = binned_extent(&shape, self.reference.binning())?;
        let dz = self.delta_z as usize;
        trace!(%shape, binning = b, dz, "FusedProjector::sweep");

        out.fill(T::zero());
        let Some(scan) = self.reference.z_range(depth) else {
            // Height map stays at plane 0: MIP over its clamped window.
            for z in 0..=dz.min(depth - 1) {
                let plane = stack.read_plane(0, z)?;
                out.par_iter_mut()
                    .zip(plane.par_iter())
                    .for_each(|(v, &s)| *v = if z == 0 { s } else { v.max_of(s) });
            }
            return Ok(HeightMap::new(w, h));
        };
        let first = scan.start().saturating_sub(dz);
        let last = (scan.end() + dz).min(depth - 1);

        let mut binned_map = vec![0u16; bw * bh];
        let mut running_max = vec![f64::NEG_INFINITY; bw * bh];
        let mut has_winner = vec![false; bw * bh];
        let mut ring: VecDeque<Cow<'_, [T]>> = VecDeque::with_capacity(dz + 1);

        for z in first..=last {
            if self.cancel.is_canceled() {
                debug!(z, "One-pass projection canceled");
                break;
            }
            let plane = stack.read_plane(0, z)?;
            let won = if scan.contains(&z) {
                let response = plane_response(&plane, w, h, &self.reference)?;
                let won = update_max(&response, z as u16, &mut running_max, &mut binned_map);
                for (flag, &hit) in has_winner.iter_mut().zip(&won) {
                    *flag |= hit;
                }
                won
            } else {
                vec![false; bw * bh]
            };

            let previous: Vec<&[T]> = ring.iter().map(|p| &**p).collect();
            out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
                let by = (y / b).min(bh - 1);
                for (x, v) in row.iter_mut().enumerate() {
                    let owner = by * bw + (x / b).min(bw - 1);
                    let i = y * w + x;
                    if won[owner] {
                        *v = previous.iter().fold(plane[i], |m, p| m.max_of(p[i]));
                    } else if has_winner[owner] && z <= binned_map[owner] as usize + dz {
                        *v = v.max_of(plane[i]);
                    }
                }
            });

            if dz > 0 {
                if ring.len() == dz {
                    ring.pop_front();
                }
                ring.push_back(plane);
            }
        }

        let full = unbin_plane(&binned_map, bw, bh, b, w, h)?;
        Ok(HeightMap::from_data(w, h, full)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SurfaceMethod;
    use crate::project::SurfaceProjector;
    use crate::reference::ReferenceSurface;

    fn textured(w: usize, h: usize, d: usize) -> Volume<u16> {
        Volume::from_fn(Shape::stack(w, h, d), |x, y, z, _, _| {
            let focus = 2 + (x / 6 + y / 6) % 4;
            let amp = 60.0 * (-((z as f64 - focus as f64).powi(2)) / 4.0).exp();
            (100.0 + amp * ((x + y) % 2) as f64 + z as f64).round() as u16
        })
    }

    fn reference() -> ReferenceSurfaceParameters {
        ReferenceSurfaceParameters::builder()
            .method(SurfaceMethod::MaxOfVariance)
            .filter_window_size(3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_streaming_matches_projector_in_range() {
        let vol = textured(12, 12, 10);
        let hm = ReferenceSurface::new(reference()).estimate(&vol).unwrap();
        for method in [ProjectionMethod::Mip, ProjectionMethod::Mean] {
            let p = ExtractSurfaceParameters::builder()
                .delta_z(0, 2)
                .projection_method(0, method)
                .build();
            let expected = SurfaceProjector::new(p.clone()).project(&vol, &hm).unwrap();
            let got = extract_streaming(&vol, &hm, &p, &CancelToken::new()).unwrap();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_streaming_out_of_range_stays_zero() {
        let vol = Volume::from_fn(Shape::stack(2, 1, 4), |_, _, z, _, _| (z + 1) as u8);
        let hm = HeightMap::from_data(2, 1, vec![1, 3]).unwrap();
        let p = ExtractSurfaceParameters::builder().z_offset(0, 2).build();
        let out = extract_streaming(&vol, &hm, &p, &CancelToken::new()).unwrap();
        assert_eq!(out.data(), &[4, 0]);
    }

    #[test]
    fn test_streaming_rejects_collect() {
        let vol: Volume<u8> = Volume::new(Shape::stack(2, 2, 3));
        let p = ExtractSurfaceParameters::builder()
            .projection_method(0, ProjectionMethod::Collect)
            .build();
        let res = extract_streaming(&vol, &HeightMap::new(2, 2), &p, &CancelToken::new());
        assert!(matches!(res, Err(SurfaceError::InvalidArgument(_))));
    }

    #[test]
    fn test_fused_matches_estimate_then_project() {
        let vol = textured(12, 12, 10);
        for dz in [0, 1, 3] {
            let hm = ReferenceSurface::new(reference()).estimate(&vol).unwrap();
            let p = ExtractSurfaceParameters::builder().delta_z(0, dz as i32).build();
            let expected = SurfaceProjector::new(p).project(&vol, &hm).unwrap();

            let (mip, fused_hm) = FusedProjector::new(reference(), dz).unwrap().project(&vol).unwrap();
            assert_eq!(fused_hm, hm);
            assert_eq!(mip.data(), expected.data());
        }
    }

    #[test]
    fn test_fused_with_binning() {
        let vol = textured(13, 11, 8);
        let params = ReferenceSurfaceParameters::builder()
            .method(SurfaceMethod::MaxOfMean)
            .filter_window_size(2)
            .binning(2)
            .build()
            .unwrap();
        let hm = ReferenceSurface::new(params.clone()).estimate(&vol).unwrap();
        let p = ExtractSurfaceParameters::builder().delta_z(0, 1).build();
        let expected = SurfaceProjector::new(p).project(&vol, &hm).unwrap();
        let (mip, fused_hm) = FusedProjector::new(params, 1).unwrap().project(&vol).unwrap();
        assert_eq!(fused_hm, hm);
        assert_eq!(mip.data(), expected.data());
    }

    #[test]
    fn test_fused_selects_target_channel() {
        let vol = Volume::from_fn(Shape::stack(4, 4, 3).with_channels(2), |_, _, z, c, _| {
            if c == 1 && z == 2 { 50u8 } else { 1 }
        });
        let params = ReferenceSurfaceParameters::builder()
            .target_channel(1)
            .filter_window_size(1)
            .build()
            .unwrap();
        let (mip, hm) = FusedProjector::new(params, 0).unwrap().project(&vol).unwrap();
        assert_eq!(hm.min_max(), Some((2, 2)));
        assert!(mip.data().iter().all(|&v| v == 50));
    }

    #[test]
    fn test_fused_empty_range_matches_two_pass() {
        let vol = Volume::from_fn(Shape::stack(4, 4, 5), |_, _, z, _, _| ((z + 1) * 10) as u8);
        let params = ReferenceSurfaceParameters::builder().z_min(10).z_max(20).build().unwrap();
        for dz in [0u32, 2] {
            let hm = ReferenceSurface::new(params.clone()).estimate(&vol).unwrap();
            let p = ExtractSurfaceParameters::builder().delta_z(0, dz as i32).build();
            let expected = SurfaceProjector::new(p).project(&vol, &hm).unwrap();

            let (mip, fused_hm) = FusedProjector::new(params.clone(), dz).unwrap().project(&vol).unwrap();
            assert_eq!(fused_hm, hm);
            assert_eq!(mip.data(), expected.data());
            assert_eq!(mip.data()[0], 10 * (dz as u8 + 1));
        }
    }

    #[test]
    fn test_fused_rejects_median() {
        let params = ReferenceSurfaceParameters::builder()
            .median_post_filter_half_size(1)
            .build()
            .unwrap();
        assert!(FusedProjector::new(params, 1).is_err());
    }
}
