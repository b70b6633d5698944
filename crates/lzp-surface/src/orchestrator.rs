//! Time-lapse driver.
//!
//! [`LocalZProjector`] walks the time points of a [`VolumeSource`] in
//! ascending order. For each one it estimates the height map on the target
//! channel, records it, projects every channel around it, then notifies the
//! listener and persists the frame. Cancellation is polled between these
//! stages; a canceled run returns the buffers built so far.
//!
//! # Example
//!
//! ```rust
//! use lzp_core::{Shape, Volume};
//! use lzp_surface::orchestrator::{LocalZProjector, RunStatus};
//! use lzp_surface::params::{ExtractSurfaceParameters, ReferenceSurfaceParameters};
//! use lzp_surface::source::InMemorySource;
//!
//! let shape = Shape::stack(8, 8, 4).with_frames(3);
//! let volume = Volume::from_fn(shape, |_, _, z, _, t| (z * 10 + t) as u16);
//! let mut lzp = LocalZProjector::new(
//!     ReferenceSurfaceParameters::default(),
//!     ExtractSurfaceParameters::default(),
//! );
//! let out = lzp.run(&InMemorySource::new(volume)).unwrap();
//! assert_eq!(out.status, RunStatus::Completed);
//! assert_eq!(out.projection.shape(), Shape::plane(8, 8).with_frames(3));
//! // Brightest plane wins under max-of-mean.
//! assert_eq!(out.projection.plane(0, 0, 2).unwrap()[0], 32);
//! ```

use crate::one_pass::FusedProjector;
use crate::params::{ExtractSurfaceParameters, ProjectionMethod, ReferenceSurfaceParameters};
use crate::project::{SurfaceProjector, check_time_point};
use crate::reference::ReferenceSurface;
use crate::sink::{FrameListener, FrameSink, frame_file_names};
use crate::source::{Frame, MaterializePolicy, VolumeSource, open_frame};
use crate::{SurfaceError, SurfaceResult};
use lzp_core::{CancelToken, ChannelOf, HeightMap, Sample, Shape, StackRef, Volume};
use tracing::{debug, info, trace, warn};

/// Options of a run that are not algorithm parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Frame access policy.
    pub policy: MaterializePolicy,
    /// Base name for persisted outputs; defaults to the source name.
    pub input_name: Option<String>,
    /// Persist each projected frame through the sink.
    pub save_each_frame: bool,
    /// Also persist each height map (requires `save_each_frame`).
    pub save_height_maps: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every time point was processed.
    Completed,
    /// The cancel token was set.
    Canceled {
        /// Reason passed to [`CancelToken::cancel`].
        reason: String,
        /// Time points fully processed before cancellation.
        completed_frames: usize,
    },
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct RunOutput<T> {
    /// Projection with a time axis; unprocessed frames stay zero.
    pub projection: Volume<T>,
    /// Height map per time point, shape `width x height t=frames`.
    pub height_maps: Volume<u16>,
    /// Completion status.
    pub status: RunStatus,
}

/// Height-map estimation plus local projection over a whole time-lapse.
pub struct LocalZProjector<T> {
    reference: ReferenceSurfaceParameters,
    extract: ExtractSurfaceParameters,
    options: RunOptions,
    cancel: CancelToken,
    listener: Option<Box<dyn FrameListener<T>>>,
    sink: Option<Box<dyn FrameSink<T>>>,
}

impl<T: Sample> LocalZProjector<T> {
    /// Creates a projector with default options.
    pub fn new(reference: ReferenceSurfaceParameters, extract: ExtractSurfaceParameters) -> Self {
        Self {
            reference,
            extract,
            options: RunOptions::default(),
            cancel: CancelToken::new(),
            listener: None,
            sink: None,
        }
    }

    /// Sets the run options.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Shares `token` for cancellation.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Installs a listener notified after each frame.
    pub fn with_listener(mut self, listener: impl FrameListener<T> + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Installs a sink for persisted frames.
    pub fn with_sink(mut self, sink: impl FrameSink<T> + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Token that cancels this projector's runs.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    fn canceled(&self, completed_frames: usize) -> RunStatus {
        let reason = self.cancel.cancel_reason().unwrap_or_default();
        info!(%reason, completed_frames, "Run canceled");
        RunStatus::Canceled {
            reason,
            completed_frames,
        }
    }

    /// Checks the source and returns the target channel to estimate on, if
    /// the source has a channel axis.
    fn check_source(&self, shape: &Shape) -> SurfaceResult<Option<usize>> {
        let (_, channels) = check_time_point(shape)?;
        let target = self.reference.target_channel();
        match shape.channels {
            Some(_) if target >= channels => Err(SurfaceError::invalid(format!(
                "target channel {target} out of range for {channels} channel(s)"
            ))),
            Some(_) => Ok(Some(target)),
            None => Ok(None),
        }
    }

    fn estimate<S: VolumeSource<T> + ?Sized>(
        &self,
        estimator: &ReferenceSurface,
        frame: &Frame<'_, T, S>,
        target: Option<usize>,
    ) -> SurfaceResult<HeightMap> {
        match target {
            Some(c) => estimator.estimate::<T, _>(&ChannelOf::new::<T>(frame, c)?),
            None => estimator.estimate::<T, _>(frame),
        }
    }

    /// Notifies the listener and persists time point `t`.
    fn publish(&mut self, t: usize, frames: usize, name: Option<&str>, projection: StackRef<'_, T>, hm: &HeightMap) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_frame(t, projection);
        }
        if !self.options.save_each_frame {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let (proj_name, surf_name) = frame_file_names(name, t, frames);
        if let Err(e) = sink.save_projection(&proj_name, projection) {
            warn!(t, name = %proj_name, error = %e, "Failed to save projection");
        }
        if self.options.save_height_maps {
            if let Err(e) = sink.save_height_map(&surf_name, hm) {
                warn!(t, name = %surf_name, error = %e, "Failed to save height map");
            }
        }
    }

    fn record(&mut self, height_maps: &mut Volume<u16>, t: usize, hm: &HeightMap) -> SurfaceResult<()> {
        height_maps.frame_mut(t)?.copy_from_slice(hm.data());
        if let Some(listener) = self.listener.as_mut() {
            listener.on_height_map(t, hm);
        }
        Ok(())
    }

    /// Processes every time point of `source`.
    ///
    /// # Errors
    ///
    /// - [`SurfaceError::InvalidArgument`] if the source has no Z axis or the
    ///   target channel is out of range
    /// - any estimation, projection or read error; persistence errors are
    ///   logged and skipped
    pub fn run<S: VolumeSource<T> + ?Sized>(&mut self, source: &S) -> SurfaceResult<RunOutput<T>> {
        let frame_shape = source.frame_shape();
        let frames = source.frames();
        let target = self.check_source(&frame_shape)?;
        let (w, h) = frame_shape.xy();

        let estimator = ReferenceSurface::new(self.reference.clone()).with_cancel(self.cancel.clone());
        let projector = SurfaceProjector::new(self.extract.clone()).with_cancel(self.cancel.clone());
        let mut projection = Volume::new(projector.output_shape(frame_shape)?.with_frames(frames));
        let mut height_maps = Volume::new(Shape::plane(w, h).with_frames(frames));
        let name = self.options.input_name.clone().or_else(|| source.name().map(str::to_owned));
        info!(shape = %frame_shape, frames, sample = T::NAME, "Starting local Z projection");

        for t in 0..frames {
            if self.cancel.is_canceled() {
                let status = self.canceled(t);
                return Ok(RunOutput { projection, height_maps, status });
            }
            let frame = open_frame(source, t, self.options.policy)?;
            trace!(t, "Estimating height map");
            let hm = self.estimate(&estimator, &frame, target)?;
            if self.cancel.is_canceled() {
                let status = self.canceled(t);
                return Ok(RunOutput { projection, height_maps, status });
            }
            self.record(&mut height_maps, t, &hm)?;

            projector.project_into(&frame, &hm, projection.frame_mut(t)?)?;
            if self.cancel.is_canceled() {
                let status = self.canceled(t);
                return Ok(RunOutput { projection, height_maps, status });
            }
            self.publish(t, frames, name.as_deref(), projection.frame(t)?, &hm);
            info!(t, frames, "Time point done");
        }

        Ok(RunOutput {
            projection,
            height_maps,
            status: RunStatus::Completed,
        })
    }

    /// Processes every time point with the fused one-pass projector.
    ///
    /// Only the target channel is projected, with its MIP half-range; the
    /// output has one plane per time point.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::InvalidArgument`] if the target channel is not a MIP
    /// with zero offset, or if a median post-filter is configured; otherwise
    /// as [`run`](Self::run).
    pub fn run_one_pass<S: VolumeSource<T> + ?Sized>(&mut self, source: &S) -> SurfaceResult<RunOutput<T>> {
        let frame_shape = source.frame_shape();
        let frames = source.frames();
        self.check_source(&frame_shape)?;
        let c = self.reference.target_channel();
        let method = self.extract.projection_method(c);
        if method != ProjectionMethod::Mip || self.extract.offset(c) != 0 {
            return Err(SurfaceError::invalid(format!(
                "one-pass projection needs MIP with offset 0 on channel {c}, got {method} with offset {}",
                self.extract.offset(c)
            )));
        }
        let fused = FusedProjector::new(self.reference.clone(), self.extract.delta_z(c))?
            .with_cancel(self.cancel.clone());

        let (w, h) = frame_shape.xy();
        let mut projection = Volume::new(Shape::plane(w, h).with_frames(frames));
        let mut height_maps = Volume::new(Shape::plane(w, h).with_frames(frames));
        let name = self.options.input_name.clone().or_else(|| source.name().map(str::to_owned));
        info!(shape = %frame_shape, frames, delta_z = fused.delta_z(), "Starting one-pass projection");

        for t in 0..frames {
            if self.cancel.is_canceled() {
                let status = self.canceled(t);
                return Ok(RunOutput { projection, height_maps, status });
            }
            let frame = open_frame(source, t, self.options.policy)?;
            let hm = fused.project_into(&frame, projection.frame_mut(t)?)?;
            if self.cancel.is_canceled() {
                let status = self.canceled(t);
                return Ok(RunOutput { projection, height_maps, status });
            }
            self.record(&mut height_maps, t, &hm)?;
            self.publish(t, frames, name.as_deref(), projection.frame(t)?, &hm);
            debug!(t, frames, "Time point done");
        }

        Ok(RunOutput {
            projection,
            height_maps,
            status: RunStatus::Completed,
        })
    }
}
