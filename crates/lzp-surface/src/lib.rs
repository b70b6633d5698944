//! # lzp-surface
//!
//! Height-map estimation and surface-guided projection for 3D+time
//! microscopy volumes.
//!
//! A curved or tilted sample is in focus at a different Z plane at every
//! (x, y). This crate finds that plane per pixel (the height map, or
//! reference surface) and then reduces a thin Z window around it to a flat,
//! in-focus image per channel and time point.
//!
//! # Modules
//!
//! - [`params`] - Estimation and extraction parameters, JSON persistence
//! - [`reference`] - Height-map estimation on one channel
//! - [`project`] - MIP, mean and thick-slab extraction around a height map
//! - [`one_pass`] - Streaming extraction and fused estimation plus MIP
//! - [`source`] - Time-lapse sources and frame access policies
//! - [`sink`] - Live preview and persistence hooks
//! - [`orchestrator`] - Per-time-point driver with cancellation
//! - [`synthetic`] - Volumes with a known focus surface
//!
//! # Quick Start
//!
//! ```rust
//! use lzp_core::Shape;
//! use lzp_surface::params::{ExtractSurfaceParameters, ReferenceSurfaceParameters, SurfaceMethod};
//! use lzp_surface::project::SurfaceProjector;
//! use lzp_surface::reference::ReferenceSurface;
//! use lzp_surface::synthetic::SyntheticFocus;
//!
//! let stack = SyntheticFocus::default().render(Shape::stack(32, 32, 20));
//! let params = ReferenceSurfaceParameters::builder()
//!     .method(SurfaceMethod::MaxOfVariance)
//!     .filter_window_size(5)
//!     .build()
//!     .unwrap();
//! let hm = ReferenceSurface::new(params).estimate(&stack).unwrap();
//! assert_eq!(hm.min_max(), Some((10, 10)));
//!
//! let out = SurfaceProjector::new(ExtractSurfaceParameters::default())
//!     .project(&stack, &hm)
//!     .unwrap();
//! assert_eq!(out.data(), stack.plane(0, 10, 0).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod collect;
mod error;
pub mod one_pass;
pub mod orchestrator;
pub mod params;
pub mod project;
pub mod reference;
pub mod sink;
pub mod source;
pub mod synthetic;

pub use error::{SurfaceError, SurfaceResult};
pub use one_pass::{FusedProjector, extract_streaming};
pub use orchestrator::{LocalZProjector, RunOptions, RunOutput, RunStatus};
pub use params::{
    ExtractSurfaceParameters, OutputLayout, ProjectionMethod, ReferenceSurfaceParameters, SurfaceMethod,
};
pub use project::SurfaceProjector;
pub use reference::ReferenceSurface;
pub use sink::{FrameListener, FrameSink, RawDirectorySink, frame_file_names};
pub use source::{Frame, InMemorySource, MaterializePolicy, VolumeSource, open_frame};
pub use synthetic::SyntheticFocus;
