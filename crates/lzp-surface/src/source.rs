//! Time-lapse sources and per-frame access.
//!
//! A [`VolumeSource`] hands out planes by `(t, c, z)`. RAM-resident sources
//! can also lend a whole frame as a [`StackRef`], which the orchestrator uses
//! directly under [`MaterializePolicy::ViewOnly`]. Other sources are read
//! plane by plane, or copied into RAM first under
//! [`MaterializePolicy::MaterializeCopy`].

use crate::{SurfaceError, SurfaceResult};
use lzp_core::{Sample, Shape, Stack, StackRef, Volume};
use std::borrow::Cow;
use tracing::debug;

/// Random-access source of a 3-5D volume.
pub trait VolumeSource<T: Sample>: Sync {
    /// Shape of one time point (no time axis).
    fn frame_shape(&self) -> Shape;

    /// Number of time points.
    fn frames(&self) -> usize;

    /// Reads plane `(c, z)` of time point `t`.
    fn read_plane(&self, t: usize, c: usize, z: usize) -> lzp_core::Result<Cow<'_, [T]>>;

    /// Zero-copy view of time point `t`, for RAM-resident sources.
    fn frame_view(&self, _t: usize) -> Option<StackRef<'_, T>> {
        None
    }

    /// Name of the source (a file name, for instance).
    fn name(&self) -> Option<&str> {
        None
    }
}

/// A source wrapping a volume held in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource<T> {
    volume: Volume<T>,
    name: Option<String>,
}

impl<T: Sample> InMemorySource<T> {
    /// Wraps `volume`. A volume without a time axis is a single frame.
    pub fn new(volume: Volume<T>) -> Self {
        Self { volume, name: None }
    }

    /// Sets the source name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Wrapped volume.
    pub fn volume(&self) -> &Volume<T> {
        &self.volume
    }
}

impl<T: Sample> VolumeSource<T> for InMemorySource<T> {
    fn frame_shape(&self) -> Shape {
        self.volume.shape().without_frames()
    }

    fn frames(&self) -> usize {
        self.volume.shape().frames_or_one()
    }

    fn read_plane(&self, t: usize, c: usize, z: usize) -> lzp_core::Result<Cow<'_, [T]>> {
        self.volume.plane(c, z, t).map(Cow::Borrowed)
    }

    fn frame_view(&self, t: usize) -> Option<StackRef<'_, T>> {
        self.volume.frame(t).ok()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// How a frame is accessed while it is processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MaterializePolicy {
    /// Use the source's zero-copy view when it has one, else read planes on
    /// demand.
    #[default]
    ViewOnly,
    /// Copy the frame into RAM before processing.
    MaterializeCopy,
}

/// One time point of a source, seen as a [`Stack`].
pub enum Frame<'a, T, S: ?Sized> {
    /// Borrowed view of RAM-resident data.
    View(StackRef<'a, T>),
    /// Planes read from the source on demand.
    Lazy {
        /// Source.
        source: &'a S,
        /// Time point.
        t: usize,
        /// Frame shape.
        shape: Shape,
    },
    /// Frame copied into RAM.
    Owned(Volume<T>),
}

impl<T: Sample, S: VolumeSource<T> + ?Sized> Stack<T> for Frame<'_, T, S> {
    fn shape(&self) -> Shape {
        match self {
            Self::View(v) => v.shape(),
            Self::Lazy { shape, .. } => *shape,
            Self::Owned(v) => v.shape(),
        }
    }

    fn read_plane(&self, c: usize, z: usize) -> lzp_core::Result<Cow<'_, [T]>> {
        match self {
            Self::View(v) => v.plane(c, z).map(Cow::Borrowed),
            Self::Lazy { source, t, .. } => source.read_plane(*t, c, z),
            Self::Owned(v) => v.plane(c, z, 0).map(Cow::Borrowed),
        }
    }
}

/// Opens time point `t` of `source` under `policy`.
///
/// # Errors
///
/// [`SurfaceError::InvalidArgument`] if `t` is out of range; read errors
/// while materializing.
pub fn open_frame<'a, T: Sample, S: VolumeSource<T> + ?Sized>(
    source: &'a S,
    t: usize,
    policy: MaterializePolicy,
) -> SurfaceResult<Frame<'a, T, S>> {
    if t >= source.frames() {
        return Err(SurfaceError::invalid(format!(
            "time point {t} out of range for {} frame(s)",
            source.frames()
        )));
    }
    let shape = source.frame_shape();
    match policy {
        MaterializePolicy::ViewOnly => Ok(match source.frame_view(t) {
            Some(view) => Frame::View(view),
            None => Frame::Lazy { source, t, shape },
        }),
        MaterializePolicy::MaterializeCopy => {
            debug!(t, %shape, "Materializing frame");
            let mut data = Vec::with_capacity(shape.len());
            for c in 0..shape.channels_or_one() {
                for z in 0..shape.depth_or_one() {
                    data.extend_from_slice(&source.read_plane(t, c, z)?);
                }
            }
            Ok(Frame::Owned(Volume::from_data(shape, data)?))
        }
    }
}
