//! Axis layout of a volume.
//!
//! A [`Shape`] always has X and Y. Depth (Z), channel (C) and time (T) axes
//! are optional, and their presence is part of the shape: a 3D single-channel
//! stack and a 4D stack with a channel axis of length 1 are different shapes.
//!
//! # Memory Layout
//!
//! Samples are stored X fastest, then Y, Z, C, T:
//!
//! ```text
//! offset(x, y, z, c, t) = x + w * (y + h * (z + d * (c + nc * t)))
//! ```
//!
//! # Example
//!
//! ```rust
//! use lzp_core::Shape;
//!
//! let shape = Shape::stack(64, 64, 20).with_channels(2);
//! assert_eq!(shape.rank(), 4);
//! assert_eq!(shape.plane_len(), 64 * 64);
//! assert_eq!(shape.len(), 64 * 64 * 20 * 2);
//! ```

use crate::{Error, Result};

/// Dimensions of a volume with explicit optional axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Width (X)
    pub width: usize,
    /// Height (Y)
    pub height: usize,
    /// Depth (Z), if the volume has a Z axis
    pub depth: Option<usize>,
    /// Channel count, if the volume has a channel axis
    pub channels: Option<usize>,
    /// Frame count, if the volume has a time axis
    pub frames: Option<usize>,
}

impl Shape {
    /// A single 2D plane.
    #[inline]
    pub const fn plane(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            depth: None,
            channels: None,
            frames: None,
        }
    }

    /// A 3D single-channel stack.
    #[inline]
    pub const fn stack(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth: Some(depth),
            channels: None,
            frames: None,
        }
    }

    /// Returns this shape with a channel axis of length `channels`.
    #[inline]
    pub const fn with_channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Returns this shape with a time axis of length `frames`.
    #[inline]
    pub const fn with_frames(mut self, frames: usize) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Returns this shape without its time axis.
    #[inline]
    pub const fn without_frames(mut self) -> Self {
        self.frames = None;
        self
    }

    /// Returns this shape without its channel axis.
    #[inline]
    pub const fn without_channels(mut self) -> Self {
        self.channels = None;
        self
    }

    /// Number of axes: 2 plus one per present optional axis.
    pub fn rank(&self) -> usize {
        2 + self.depth.is_some() as usize
            + self.channels.is_some() as usize
            + self.frames.is_some() as usize
    }

    /// Depth, or 1 when there is no Z axis.
    #[inline]
    pub fn depth_or_one(&self) -> usize {
        self.depth.unwrap_or(1)
    }

    /// Channel count, or 1 when there is no channel axis.
    #[inline]
    pub fn channels_or_one(&self) -> usize {
        self.channels.unwrap_or(1)
    }

    /// Frame count, or 1 when there is no time axis.
    #[inline]
    pub fn frames_or_one(&self) -> usize {
        self.frames.unwrap_or(1)
    }

    /// Samples per plane.
    #[inline]
    pub fn plane_len(&self) -> usize {
        self.width * self.height
    }

    /// Number of planes.
    #[inline]
    pub fn plane_count(&self) -> usize {
        self.depth_or_one() * self.channels_or_one() * self.frames_or_one()
    }

    /// Total number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.plane_len() * self.plane_count()
    }

    /// Whether the shape holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// XY extent as a tuple.
    #[inline]
    pub fn xy(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Lengths of the present axes in memory order (X, Y, Z, C, T).
    pub fn dims(&self) -> Vec<usize> {
        let mut dims = vec![self.width, self.height];
        dims.extend(self.depth);
        dims.extend(self.channels);
        dims.extend(self.frames);
        dims
    }

    /// Samples per time point (one frame).
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.plane_len() * self.depth_or_one() * self.channels_or_one()
    }

    /// Index of plane (c, z, t) in the plane sequence.
    ///
    /// Returns an error if any index is beyond its axis.
    pub fn plane_index(&self, c: usize, z: usize, t: usize) -> Result<usize> {
        let (nc, nz, nt) = (
            self.channels_or_one(),
            self.depth_or_one(),
            self.frames_or_one(),
        );
        if c >= nc || z >= nz || t >= nt {
            return Err(Error::PlaneOutOfBounds {
                c,
                z,
                t,
                channels: nc,
                depth: nz,
                frames: nt,
            });
        }
        Ok(z + nz * (c + nc * t))
    }

    /// Sample offset of the first element of plane (c, z, t).
    pub fn plane_offset(&self, c: usize, z: usize, t: usize) -> Result<usize> {
        Ok(self.plane_index(c, z, t)? * self.plane_len())
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if let Some(d) = self.depth {
            write!(f, " z={d}")?;
        }
        if let Some(c) = self.channels {
            write!(f, " c={c}")?;
        }
        if let Some(t) = self.frames {
            write!(f, " t={t}")?;
        }
        Ok(())
    }
}
