//! Plane access abstraction for one time point.
//!
//! The estimator and projectors only ever need "give me plane (c, z)". The
//! [`Stack`] trait lets them run on RAM-resident views (borrowed planes) and
//! on lazily-read stacks (owned planes) through the same code path.

use crate::{Error, Result, Shape, StackRef, Volume};
use std::borrow::Cow;

/// Random access to the planes of a stack without a time axis.
pub trait Stack<T: Clone>: Sync {
    /// Shape of the stack.
    fn shape(&self) -> Shape;

    /// Reads plane (c, z). Absent axes take index 0.
    fn read_plane(&self, c: usize, z: usize) -> Result<Cow<'_, [T]>>;
}

impl<T: Clone + Sync> Stack<T> for StackRef<'_, T> {
    fn shape(&self) -> Shape {
        StackRef::shape(self)
    }

    fn read_plane(&self, c: usize, z: usize) -> Result<Cow<'_, [T]>> {
        self.plane(c, z).map(Cow::Borrowed)
    }
}

impl<T: Clone + Sync> Stack<T> for Volume<T> {
    fn shape(&self) -> Shape {
        Volume::shape(self)
    }

    fn read_plane(&self, c: usize, z: usize) -> Result<Cow<'_, [T]>> {
        self.plane(c, z, 0).map(Cow::Borrowed)
    }
}

impl<T: Clone, S: Stack<T> + ?Sized> Stack<T> for &S {
    fn shape(&self) -> Shape {
        (**self).shape()
    }

    fn read_plane(&self, c: usize, z: usize) -> Result<Cow<'_, [T]>> {
        (**self).read_plane(c, z)
    }
}

/// Single channel of a multi-channel stack, seen as a 3D stack.
pub struct ChannelOf<'a, S: ?Sized> {
    inner: &'a S,
    channel: usize,
}

impl<'a, S: ?Sized> ChannelOf<'a, S> {
    /// Selects `channel` of `inner`.
    ///
    /// A stack without a channel axis accepts only channel 0.
    pub fn new<T: Clone>(inner: &'a S, channel: usize) -> Result<Self>
    where
        S: Stack<T>,
    {
        let nc = inner.shape().channels_or_one();
        if channel >= nc {
            return Err(Error::invalid_argument(format!(
                "channel {channel} out of range for {nc} channel(s)"
            )));
        }
        Ok(Self { inner, channel })
    }

    /// Selected channel index.
    #[inline]
    pub fn channel(&self) -> usize {
        self.channel
    }
}

impl<T: Clone, S: Stack<T> + ?Sized> Stack<T> for ChannelOf<'_, S> {
    fn shape(&self) -> Shape {
        self.inner.shape().without_channels()
    }

    fn read_plane(&self, _c: usize, z: usize) -> Result<Cow<'_, [T]>> {
        self.inner.read_plane(self.channel, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_as_stack() {
        let vol = Volume::from_fn(Shape::stack(2, 1, 3), |x, _, z, _, _| (x + 2 * z) as u8);
        let plane = vol.read_plane(0, 2).unwrap();
        assert!(matches!(plane, Cow::Borrowed(_)));
        assert_eq!(&*plane, &[4, 5]);
    }

    #[test]
    fn test_channel_of() {
        let shape = Shape::stack(1, 1, 2).with_channels(3);
        let vol = Volume::from_fn(shape, |_, _, z, c, _| (10 * c + z) as u16);
        let frame = vol.frame(0).unwrap();
        let ch = ChannelOf::new(&frame, 2).unwrap();
        assert_eq!(ch.shape(), Shape::stack(1, 1, 2));
        assert_eq!(&*ch.read_plane(0, 1).unwrap(), &[21]);
        assert!(ChannelOf::new(&frame, 3).is_err());
    }

    #[test]
    fn test_channel_of_without_channel_axis() {
        let vol: Volume<u8> = Volume::new(Shape::stack(1, 1, 2));
        assert!(ChannelOf::new(&vol, 0).is_ok());
        assert!(ChannelOf::new(&vol, 1).is_err());
    }
}
