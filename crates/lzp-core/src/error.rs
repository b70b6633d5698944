//! Error types for lzp-core operations.
//!
//! # Overview
//!
//! The [`Error`] enum covers the failure modes of the container types:
//! - Shape validation (zero-sized axes, buffer length mismatches)
//! - Rank checks between declared and actual dimensionality
//! - Plane indexing outside the volume
//! - I/O from plane readers backed by storage
//!
//! # Usage
//!
//! ```rust
//! use lzp_core::{Error, Result};
//!
//! fn check_rank(rank: usize) -> Result<()> {
//!     if rank != 3 {
//!         return Err(Error::rank_mismatch("height-map source", 3, rank));
//!     }
//!     Ok(())
//! }
//! assert!(check_rank(4).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by core container operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument violates a documented precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A volume does not have the dimensionality an operation expects.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lzp_core::Error;
    ///
    /// let err = Error::rank_mismatch("single-channel source", 3, 4);
    /// assert!(err.to_string().contains("3D"));
    /// assert!(err.to_string().contains("4D"));
    /// ```
    #[error("expected {what} to be {expected}D, but was {got}D")]
    RankMismatch {
        /// Description of the offending input
        what: String,
        /// Expected rank
        expected: usize,
        /// Actual rank
        got: usize,
    },

    /// Two planes or volumes disagree on their XY extent.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First width
        a_width: usize,
        /// First height
        a_height: usize,
        /// Second width
        b_width: usize,
        /// Second height
        b_height: usize,
    },

    /// A buffer length does not match the shape it is wrapped with.
    #[error("buffer length {got} does not match shape ({expected} samples)")]
    BufferLength {
        /// Samples required by the shape
        expected: usize,
        /// Samples provided
        got: usize,
    },

    /// A plane index (channel, z, t) is outside the volume.
    #[error("plane (c={c}, z={z}, t={t}) out of bounds for {channels}x{depth}x{frames} planes")]
    PlaneOutOfBounds {
        /// Channel index
        c: usize,
        /// Z index
        z: usize,
        /// Time index
        t: usize,
        /// Channel count
        channels: usize,
        /// Depth
        depth: usize,
        /// Frame count
        frames: usize,
    },

    /// I/O error from a storage-backed plane reader.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an [`Error::InvalidArgument`] error.
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an [`Error::RankMismatch`] error.
    #[inline]
    pub fn rank_mismatch(what: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::RankMismatch {
            what: what.into(),
            expected,
            got,
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (usize, usize), b: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Returns `true` for configuration errors (bad arguments, shapes, ranks).
    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_mismatch_message() {
        let err = Error::rank_mismatch("multi-channel source", 4, 3);
        let msg = err.to_string();
        assert!(msg.contains("multi-channel source"));
        assert!(msg.contains("4D"));
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((64, 64), (32, 16));
        let msg = err.to_string();
        assert!(msg.contains("64x64"));
        assert!(msg.contains("32x16"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "plane missing");
        let err: Error = io_err.into();
        assert!(!err.is_invalid_argument());
    }
}
