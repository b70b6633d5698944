//! Thick-slab extraction without reduction.
//!
//! Slice `z_out` of a collected channel reads source plane
//! `h - delta_z + z_out + offset` for `z_out` in `0..=2 * delta_z`. Reads
//! outside the stack produce zeros, and slab slices past `2 * delta_z` stay
//! zero when another channel sets a thicker slab.
//!
//! Slabs are anchored at slice 0, not centred. In a slab whose depth comes
//! from a thicker channel, a thinner collected channel has its surface plane
//! at slice `delta_z(c)`, while reduced channels sit at the centre slice
//! `max_delta_z`. Only channels sharing the largest half-range line up.

use crate::SurfaceResult;
use crate::project::{PlaneCache, window};
use lzp_core::{HeightMap, Sample, Stack};
use rayon::prelude::*;
use tracing::trace;

/// Copies the Z window of channel `c` into `out`, a zeroed slab of at least
/// `1 + 2 * delta_z` planes.
pub(crate) fn collect_channel<T: Sample, S: Stack<T> + ?Sized>(
    stack: &S,
    c: usize,
    height_map: &HeightMap,
    offset: i32,
    delta_z: u32,
    out: &mut [T],
) -> SurfaceResult<()> {
    let Some((lo, hi)) = height_map.min_max() else {
        return Ok(());
    };
    let cache = PlaneCache::load(stack, c, window(lo, offset, delta_z).0, window(hi, offset, delta_z).1)?;
    let w = height_map.width();
    let plane_len = height_map.data().len();
    let heights = height_map.data();
    let slices = 1 + 2 * delta_z as usize;
    trace!(c, offset, delta_z, slices, "collect_channel");

    out.par_chunks_mut(plane_len)
        .take(slices)
        .enumerate()
        .for_each(|(z_out, slice)| {
            for (y, row) in slice.chunks_mut(w).enumerate() {
                for (x, v) in row.iter_mut().enumerate() {
                    let i = y * w + x;
                    let z = window(heights[i], offset, delta_z).0 + z_out as i64;
                    if let Some(plane) = cache.get(z) {
                        *v = plane[i];
                    }
                }
            }
        });
    Ok(())
}
