//! Error types for vision operations.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while analysing a frame.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Frame could not be decoded as an image: {0}")]
    UnreadableFrame(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Detection failed: {0}")]
    DetectionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Create an unreadable frame error.
    pub fn unreadable(handle: impl Into<String>) -> Self {
        Self::UnreadableFrame(handle.into())
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
