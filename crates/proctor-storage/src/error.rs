//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during frame storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Payload could not be decoded: {0}")]
    DecodeFailed(String),

    #[error("Invalid frame handle: {0}")]
    InvalidHandle(String),

    #[error("Frame not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn decode_failed(msg: impl Into<String>) -> Self {
        Self::DecodeFailed(msg.into())
    }

    pub fn invalid_handle(handle: impl Into<String>) -> Self {
        Self::InvalidHandle(handle.into())
    }

    pub fn not_found(handle: impl Into<String>) -> Self {
        Self::NotFound(handle.into())
    }

    /// Whether the caller sent a bad payload rather than the store failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::DecodeFailed(_) | Self::InvalidHandle(_))
    }
}
