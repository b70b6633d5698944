//! Dense sample volumes and borrowed per-frame views.
//!
//! This module provides the container types:
//! - [`Volume`] - owned dense buffer of planes (X, Y[, Z][, C][, T])
//! - [`StackRef`] - borrowed view of one time point (no time axis)
//!
//! # Memory Layout
//!
//! Planes are contiguous row-major slices of `width * height` samples, laid
//! out Z fastest, then C, then T. One time point is therefore a contiguous
//! run of memory, and so is one channel of one time point, which makes
//! [`Volume::frame`] and [`StackRef::channel`] zero-copy.
//!
//! # Usage
//!
//! ```rust
//! use lzp_core::{Shape, Volume};
//!
//! let shape = Shape::stack(4, 4, 3).with_channels(2).with_frames(5);
//! let mut vol: Volume<u16> = Volume::new(shape);
//! vol.plane_mut(1, 2, 4).unwrap()[0] = 7;
//!
//! let frame = vol.frame(4).unwrap();
//! assert_eq!(frame.shape().rank(), 4);
//! assert_eq!(frame.channel(1).unwrap().plane(0, 2).unwrap()[0], 7);
//! ```

use crate::{Error, Result, Sample, Shape};

/// Owned dense volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T: Sample> Volume<T> {
    /// Creates a zero-filled volume.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            data: vec![T::zero(); shape.len()],
        }
    }

    /// Builds a volume by evaluating `f(x, y, z, c, t)` for every sample.
    ///
    /// Absent axes are passed as index 0.
    pub fn from_fn<F>(shape: Shape, f: F) -> Self
    where
        F: Fn(usize, usize, usize, usize, usize) -> T,
    {
        let (w, h) = shape.xy();
        let (nz, nc, nt) = (
            shape.depth_or_one(),
            shape.channels_or_one(),
            shape.frames_or_one(),
        );
        let mut data = Vec::with_capacity(shape.len());
        for t in 0..nt {
            for c in 0..nc {
                for z in 0..nz {
                    for y in 0..h {
                        for x in 0..w {
                            data.push(f(x, y, z, c, t));
                        }
                    }
                }
            }
        }
        Self { shape, data }
    }
}

impl<T> Volume<T> {
    /// Wraps an existing buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if `data.len()` differs from
    /// `shape.len()`.
    pub fn from_data(shape: Shape, data: Vec<T>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(Error::BufferLength {
                expected: shape.len(),
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Shape of the volume.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// All samples in memory order.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to all samples.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the volume, returning its buffer.
    #[inline]
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Plane (c, z, t). Absent axes take index 0.
    pub fn plane(&self, c: usize, z: usize, t: usize) -> Result<&[T]> {
        let start = self.shape.plane_offset(c, z, t)?;
        Ok(&self.data[start..start + self.shape.plane_len()])
    }

    /// Mutable plane (c, z, t).
    pub fn plane_mut(&mut self, c: usize, z: usize, t: usize) -> Result<&mut [T]> {
        let start = self.shape.plane_offset(c, z, t)?;
        let len = self.shape.plane_len();
        Ok(&mut self.data[start..start + len])
    }

    /// Zero-copy view of time point `t`.
    pub fn frame(&self, t: usize) -> Result<StackRef<'_, T>> {
        let range = self.frame_range(t)?;
        Ok(StackRef {
            shape: self.shape.without_frames(),
            data: &self.data[range],
        })
    }

    /// Mutable samples of time point `t`.
    pub fn frame_mut(&mut self, t: usize) -> Result<&mut [T]> {
        let range = self.frame_range(t)?;
        Ok(&mut self.data[range])
    }

    fn frame_range(&self, t: usize) -> Result<std::ops::Range<usize>> {
        let frames = self.shape.frames_or_one();
        if t >= frames {
            return Err(Error::PlaneOutOfBounds {
                c: 0,
                z: 0,
                t,
                channels: self.shape.channels_or_one(),
                depth: self.shape.depth_or_one(),
                frames,
            });
        }
        let len = self.shape.frame_len();
        Ok(t * len..(t + 1) * len)
    }
}

/// Borrowed view of a stack without a time axis.
#[derive(Debug, Clone, Copy)]
pub struct StackRef<'a, T> {
    shape: Shape,
    data: &'a [T],
}

impl<'a, T> StackRef<'a, T> {
    /// Wraps a borrowed buffer.
    ///
    /// # Errors
    ///
    /// Fails if the shape has a time axis or the length does not match.
    pub fn new(shape: Shape, data: &'a [T]) -> Result<Self> {
        if shape.frames.is_some() {
            return Err(Error::invalid_argument(
                "a stack view cannot have a time axis",
            ));
        }
        if data.len() != shape.len() {
            return Err(Error::BufferLength {
                expected: shape.len(),
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Shape of the view.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Underlying samples.
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Plane (c, z) of the view.
    pub fn plane(&self, c: usize, z: usize) -> Result<&'a [T]> {
        let start = self.shape.plane_offset(c, z, 0)?;
        Ok(&self.data[start..start + self.shape.plane_len()])
    }

    /// Zero-copy view of channel `c` as a 3D stack.
    pub fn channel(&self, c: usize) -> Result<StackRef<'a, T>> {
        let nc = self.shape.channels_or_one();
        if c >= nc {
            return Err(Error::PlaneOutOfBounds {
                c,
                z: 0,
                t: 0,
                channels: nc,
                depth: self.shape.depth_or_one(),
                frames: 1,
            });
        }
        let len = self.shape.plane_len() * self.shape.depth_or_one();
        Ok(StackRef {
            shape: self.shape.without_channels(),
            data: &self.data[c * len..(c + 1) * len],
        })
    }
}

impl<T: Clone> StackRef<'_, T> {
    /// Copies the view into an owned volume.
    pub fn to_volume(&self) -> Volume<T> {
        Volume {
            shape: self.shape,
            data: self.data.to_vec(),
        }
    }
}
