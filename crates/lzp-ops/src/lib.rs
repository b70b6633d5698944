//! # lzp-ops
//!
//! Plane operations composed by the local Z projection pipeline.
//!
//! All operations take single-channel row-major planes as slices plus their
//! width and height, and return freshly allocated planes. Work is split over
//! rows (or grid blocks) on the rayon pool.
//!
//! # Modules
//!
//! - [`bin`] - Integer-factor binning and nearest-neighbour unbinning
//! - [`filter`] - Gaussian blur and median filter
//! - [`stats`] - Dense sliding-window mean and variance
//! - [`grid`] - Sparse-grid statistic with bilinear upscaling
//! - [`interp`] - N-linear upscaling of a coarse grid
//!
//! # Example
//!
//! ```rust
//! use lzp_ops::bin::{bin_plane, Reducer};
//! use lzp_ops::stats::window_variance;
//!
//! let plane = vec![1.0f32; 64 * 64];
//! let (binned, w, h) = bin_plane(&plane, 64, 64, 4, Reducer::Mean).unwrap();
//! let var = window_variance(&binned, w, h, 2).unwrap();
//! assert_eq!(var.len(), 16 * 16);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod bin;
pub mod filter;
pub mod grid;
pub mod interp;
pub mod stats;

pub use bin::{bin, bin_plane, unbin, unbin_plane, Reducer};
pub use error::{OpsError, OpsResult};
pub use filter::{gaussian_blur, median};
pub use grid::sparse_statistic;
pub use interp::upscale_nlinear;
pub use stats::{window_mean, window_statistic, window_variance, WindowStatistic};
