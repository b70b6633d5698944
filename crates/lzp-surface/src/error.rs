//! Error types for surface estimation and projection.

use thiserror::Error;

/// Error type for surface estimation, projection and orchestration.
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// Container error (shape, rank, plane access).
    #[error(transparent)]
    Core(#[from] lzp_core::Error),

    /// Plane operation error (binning, filtering).
    #[error(transparent)]
    Ops(#[from] lzp_ops::OpsError),

    /// Parameter or input violates a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Parameter (de)serialization failed.
    #[error("parameter serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parameter file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SurfaceError {
    /// Creates a [`SurfaceError::InvalidArgument`] error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;
