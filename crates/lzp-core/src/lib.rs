//! # lzp-core
//!
//! Core types for local Z projection of microscopy volumes.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - [`Sample`] - Scalar sample trait for `u8`, `u16`, `u32`, `f16`, `f32`, `f64`
//! - [`Shape`] - Volume dimensions with explicit optional Z/C/T axes
//! - [`Volume`], [`StackRef`] - Owned volume and zero-copy per-frame view
//! - [`Stack`] - Plane access for one time point, in memory or lazily read
//! - [`HeightMap`] - Per-pixel best-focus Z index
//! - [`CancelToken`] - Cooperative cancellation flag with reason
//!
//! ## Crate Structure
//!
//! ```text
//! lzp-core (this crate)
//!    ^
//!    |
//!    +-- lzp-ops (binning, filters, window statistics)
//!    +-- lzp-surface (height maps, projection, orchestration)
//!    +-- lzp-cli
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cancel;
pub mod error;
pub mod height_map;
pub mod sample;
pub mod shape;
pub mod stack;
pub mod volume;

pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use height_map::HeightMap;
pub use sample::{Sample, plane_to_f32};
pub use shape::Shape;
pub use stack::{ChannelOf, Stack};
pub use volume::{StackRef, Volume};

/// Prelude module for convenient imports.
///
/// ```
/// use lzp_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::error::{Error, Result};
    pub use crate::height_map::HeightMap;
    pub use crate::sample::Sample;
    pub use crate::shape::Shape;
    pub use crate::stack::{ChannelOf, Stack};
    pub use crate::volume::{StackRef, Volume};
}
