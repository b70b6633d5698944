//! Surface-guided extraction.
//!
//! [`SurfaceProjector`] reads, for every channel and pixel, a Z window
//! centred on `height + offset` and either reduces it (MIP, mean) or copies
//! it out as a thick slab (Collect, see [`crate::collect`]).
//!
//! Reduced windows are clamped at both ends to the stack, so every pixel
//! reduces at least one plane. Collected windows are zero-filled instead.
//!
//! When at least one channel collects, the whole output becomes a slab of
//! `1 + 2 * max_delta_z` planes per channel and reduced channels write into
//! the centre slice. Collected channels with a smaller half-range start at
//! slice 0, so their surface plane is off-centre (see [`crate::collect`]).

use crate::collect::collect_channel;
use crate::params::{ExtractSurfaceParameters, OutputLayout, ProjectionMethod};
use crate::{SurfaceError, SurfaceResult};
use lzp_core::{CancelToken, Error as CoreError, HeightMap, Sample, Shape, Stack, Volume};
use rayon::prelude::*;
use std::borrow::Cow;
use tracing::{debug, trace};

/// Depth and channel count of a time-point stack.
pub(crate) fn check_time_point(shape: &Shape) -> SurfaceResult<(usize, usize)> {
    if shape.frames.is_some() {
        return Err(SurfaceError::invalid(format!(
            "expected a single time point, got {shape}"
        )));
    }
    let Some(depth) = shape.depth else {
        return Err(SurfaceError::invalid(format!("source {shape} has no Z axis")));
    };
    if depth == 0 {
        return Err(SurfaceError::invalid(format!("source {shape} has no Z planes")));
    }
    Ok((depth, shape.channels_or_one()))
}

/// Planes `[first, last]` of one channel, read once.
pub(crate) struct PlaneCache<'a, T: Clone> {
    first: i64,
    planes: Vec<Cow<'a, [T]>>,
}

impl<'a, T: Clone> PlaneCache<'a, T> {
    /// Reads the planes of channel `c` in `[lo, hi]` that exist in the stack.
    pub fn load<S: Stack<T> + ?Sized>(stack: &'a S, c: usize, lo: i64, hi: i64) -> SurfaceResult<Self> {
        let depth = stack.shape().depth_or_one() as i64;
        let first = lo.max(0);
        let last = hi.min(depth - 1);
        let planes = (first..=last)
            .map(|z| stack.read_plane(c, z as usize))
            .collect::<lzp_core::Result<Vec<_>>>()?;
        trace!(c, first, last, "PlaneCache::load");
        Ok(Self { first, planes })
    }

    /// Plane `z`, or `None` outside the cached range.
    #[inline]
    pub fn get(&self, z: i64) -> Option<&[T]> {
        if z < self.first {
            return None;
        }
        self.planes.get((z - self.first) as usize).map(|p| &**p)
    }
}

/// Window bounds `[h + offset - dz, h + offset + dz]`, unclamped.
#[inline]
pub(crate) fn window(h: u16, offset: i32, delta_z: u32) -> (i64, i64) {
    let centre = h as i64 + offset as i64;
    (centre - delta_z as i64, centre + delta_z as i64)
}

/// Reduces one channel into `out` (one full-resolution plane).
fn reduce_channel<T: Sample, S: Stack<T> + ?Sized>(
    stack: &S,
    c: usize,
    height_map: &HeightMap,
    offset: i32,
    delta_z: u32,
    method: ProjectionMethod,
    out: &mut [T],
) -> SurfaceResult<()> {
    let Some((lo, hi)) = height_map.min_max() else {
        return Ok(());
    };
    let last = stack.shape().depth_or_one() as i64 - 1;
    let first = window(lo, offset, delta_z).0.clamp(0, last);
    let final_z = window(hi, offset, delta_z).1.clamp(0, last);
    let cache = PlaneCache::load(stack, c, first, final_z)?;
    let w = height_map.width();
    let heights = height_map.data();

    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, v) in row.iter_mut().enumerate() {
            let i = y * w + x;
            let (a, b) = window(heights[i], offset, delta_z);
            let (a, b) = (a.clamp(0, last), b.clamp(0, last));
            let samples = (a..=b).filter_map(|z| cache.get(z)).map(|p| p[i]);
            *v = match method {
                ProjectionMethod::Mean => {
                    let (mut sum, mut n) = (0.0f64, 0usize);
                    for s in samples {
                        sum += s.to_f64();
                        n += 1;
                    }
                    if n == 0 { T::zero() } else { T::from_f64(sum / n as f64) }
                }
                _ => samples.fold(None, |m: Option<T>, s| Some(m.map_or(s, |m| m.max_of(s))))
                    .unwrap_or_default(),
            };
        }
    });
    Ok(())
}

/// Extracts the local projection around a height map.
///
/// # Example
///
/// ```rust
/// use lzp_core::{HeightMap, Shape, Volume};
/// use lzp_surface::params::ExtractSurfaceParameters;
/// use lzp_surface::project::SurfaceProjector;
///
/// let stack = Volume::from_fn(Shape::stack(4, 4, 5), |_, _, z, _, _| z as u8 * 10);
/// let hm = HeightMap::filled(4, 4, 2);
/// let params = ExtractSurfaceParameters::builder().delta_z(0, 1).build();
/// let out = SurfaceProjector::new(params).project(&stack, &hm).unwrap();
/// assert_eq!(out.data(), &[30u8; 16]);
/// ```
#[derive(Debug, Clone)]
pub struct SurfaceProjector {
    params: ExtractSurfaceParameters,
    cancel: CancelToken,
}

impl SurfaceProjector {
    /// Creates a projector with its own cancel token.
    pub fn new(params: ExtractSurfaceParameters) -> Self {
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

    /// Extraction parameters.
    pub fn params(&self) -> &ExtractSurfaceParameters {
        &self.params
    }

    /// Cancel token polled between channels.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Shape of the output for one time point of `source` shape.
    ///
    /// Plane per channel for reduced outputs, slab per channel otherwise.
    /// The channel axis is kept only if the source has one.
    pub fn output_shape(&self, source: Shape) -> SurfaceResult<Shape> {
        let (_, channels) = check_time_point(&source)?;
        let (w, h) = source.xy();
        let base = match self.params.layout(channels) {
            OutputLayout::Projection => Shape::plane(w, h),
            OutputLayout::Slab { depth, .. } => Shape::stack(w, h, depth),
        };
        Ok(match source.channels {
            Some(c) => base.with_channels(c),
            None => base,
        })
    }

    /// Projects `stack` into a newly allocated volume.
    pub fn project<T: Sample, S: Stack<T> + ?Sized>(
        &self,
        stack: &S,
        height_map: &HeightMap,
    ) -> SurfaceResult<Volume<T>> {
        let mut out = Volume::new(self.output_shape(stack.shape())?);
        self.project_into(stack, height_map, out.data_mut())?;
        Ok(out)
    }

    /// Projects `stack` into `out`, laid out as [`output_shape`](Self::output_shape).
    ///
    /// Channels are processed in order. On cancellation the remaining
    /// channels are left untouched and `Ok` is returned.
    ///
    /// # Errors
    ///
    /// - [`SurfaceError::InvalidArgument`] for a time axis or a missing Z axis
    /// - dimension mismatch if the height map extent differs from the stack
    /// - buffer length mismatch if `out` does not fit the output shape
    pub fn project_into<T: Sample, S: Stack<T> + ?Sized>(
        &self,
        stack: &S,
        height_map: &HeightMap,
        out: &mut [T],
    ) -> SurfaceResult<()> {
        let shape = stack.shape();
        let (_, channels) = check_time_point(&shape)?;
        let (w, h) = shape.xy();
        height_map.check_extent(w, h)?;
        let out_shape = self.output_shape(shape)?;
        if out.len() != out_shape.len() {
            return Err(CoreError::BufferLength {
                expected: out_shape.len(),
                got: out.len(),
            }
            .into());
        }
        trace!(%shape, %out_shape, "SurfaceProjector::project_into");

        let layout = self.params.layout(channels);
        let plane_len = w * h;
        let channel_len = layout.depth() * plane_len;
        for (c, chunk) in out.chunks_mut(channel_len.max(1)).enumerate().take(channels) {
            if self.cancel.is_canceled() {
                debug!(c, "Projection canceled");
                break;
            }
            let method = self.params.projection_method(c);
            let offset = self.params.offset(c);
            let dz = self.params.delta_z(c);
            debug!(c, %method, offset, dz, "Projecting channel");

            chunk.fill(T::zero());
            if method == ProjectionMethod::Collect {
                collect_channel(stack, c, height_map, offset, dz, chunk)?;
            } else {
                let centre = layout.centre() * plane_len;
                let plane = &mut chunk[centre..centre + plane_len];
                reduce_channel(stack, c, height_map, offset, dz, method, plane)?;
            }
        }
        Ok(())
    }
}
