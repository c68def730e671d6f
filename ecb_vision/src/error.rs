// THEORY:
// A single error type for the whole engine. Every stage returns
// `Result<_, VisionError>` so a failure anywhere in the pipeline surfaces at the
// binary boundary with one match. The three semantic kinds mirror how the tool
// is expected to fail: a rejected configuration, an input with nothing to show,
// and the I/O underneath.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    // =========================================================================
    // === Semantic errors
    // =========================================================================
    /// Mutually exclusive or out-of-range options. Raised before any analysis.
    #[error("{0}")]
    InvalidConfiguration(String),

    /// The input produced nothing to render (no repeated block, no pixels).
    #[error("{0}")]
    EmptyResult(String),

    /// A histogram worker panicked or was cancelled.
    #[error("Histogram worker failed: {0}")]
    Worker(String),

    // =========================================================================
    // === External error wrappers
    // =========================================================================
    #[error("I/O error: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("Image operation failed: {0}")]
    Image(#[from] image::ImageError),
}

impl VisionError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        VisionError::InvalidConfiguration(message.into())
    }

    pub(crate) fn empty(message: impl Into<String>) -> Self {
        VisionError::EmptyResult(message.into())
    }
}

pub type VisionResult<T> = Result<T, VisionError>;
