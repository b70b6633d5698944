//! Error types for plane operations.

use thiserror::Error;

/// Error type for plane operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Buffers or shapes have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for plane operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Checks that a plane buffer holds exactly `width * height` samples.
pub(crate) fn check_plane<T>(src: &[T], width: usize, height: usize) -> OpsResult<()> {
    let expected = width
        .checked_mul(height)
        .ok_or_else(|| OpsError::InvalidDimensions("plane dimensions overflow".into()))?;
    if src.len() != expected {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} samples, got {}",
            expected,
            src.len()
        )));
    }
    Ok(())
}
