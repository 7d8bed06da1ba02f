//! Error types shared by every strategy.
//!
//! Only [`DeoverlapError::TooFewPoints`] and [`DeoverlapError::NonFinitePosition`]
//! ever reach a caller of the public strategy functions, and
//! [`DeoverlapError::MissingDimensions`] comes from coordinate-array
//! conversion. The geometric variants are raised by the offset primitive and
//! recovered from inside the run segmentation strategy.

use thiserror::Error;

/// Errors produced while de-overlapping a trace.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeoverlapError {
    /// The trace is shorter than the strategy requires.
    #[error("trace has {actual} point(s), at least {required} required")]
    TooFewPoints { required: usize, actual: usize },

    /// A coordinate array holds fewer than the two required dimensions.
    #[error("position needs longitude and latitude, got {dimensions} value(s)")]
    MissingDimensions { dimensions: usize },

    /// A position carries a NaN or infinite longitude/latitude.
    #[error("position {index} has a non-finite longitude or latitude")]
    NonFinitePosition { index: usize },

    /// Zero-length geometry (all vertices coincide).
    #[error("degenerate geometry: fewer than two distinct vertices")]
    DegenerateGeometry,

    /// The parallel offset did not yield a usable curve.
    #[error("parallel offset failed: {0}")]
    OffsetFailure(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DeoverlapError>;

/// Reject traces shorter than `required`.
pub(crate) fn ensure_len<T>(points: &[T], required: usize) -> Result<()> {
    if points.len() < required {
        return Err(DeoverlapError::TooFewPoints {
            required,
            actual: points.len(),
        });
    }
    Ok(())
}
