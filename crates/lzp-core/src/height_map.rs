//! Per-pixel best-focus Z index.

use crate::{Error, Result};

/// 2D grid of Z indices, one per (x, y) of the source stack.
///
/// Values are plane indices into the stack the map was estimated from and
/// are bounded by the Z range that was scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightMap {
    width: usize,
    height: usize,
    data: Vec<u16>,
}

impl HeightMap {
    /// Creates a zero-filled map.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    /// Creates a map with every value set to `z`.
    pub fn filled(width: usize, height: usize, z: u16) -> Self {
        Self {
            width,
            height,
            data: vec![z; width * height],
        }
    }

    /// Wraps a row-major buffer.
    pub fn from_data(width: usize, height: usize, data: Vec<u16>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::BufferLength {
                expected: width * height,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major values.
    #[inline]
    pub fn data(&self) -> &[u16] {
        &self.data
    }

    /// Mutable row-major values.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// Consumes the map, returning its buffer.
    #[inline]
    pub fn into_data(self) -> Vec<u16> {
        self.data
    }

    /// Value at (x, y), if in bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u16> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Sets the value at (x, y). Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: u16) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = z;
        }
    }

    /// Smallest and largest value, or `None` for an empty map.
    pub fn min_max(&self) -> Option<(u16, u16)> {
        let min = *self.data.iter().min()?;
        let max = *self.data.iter().max()?;
        Some((min, max))
    }

    /// Checks that the map covers exactly `width x height`.
    pub fn check_extent(&self, width: usize, height: usize) -> Result<()> {
        if (self.width, self.height) != (width, height) {
            return Err(Error::dimension_mismatch(
                (self.width, self.height),
                (width, height),
            ));
        }
        Ok(())
    }
}
