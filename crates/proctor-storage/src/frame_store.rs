//! Persistence of captured frames.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use proctor_vision::Frame;

use crate::error::{StorageError, StorageResult};

/// Extension used when the bytes are not a recognised image format.
const FALLBACK_EXTENSION: &str = "bin";

/// Split a `<header>,<body>` payload and base64-decode the body.
///
/// Exactly one comma is accepted.
pub fn decode_payload(payload: &str) -> StorageResult<Vec<u8>> {
    let parts: Vec<&str> = payload.split(',').collect();
    let [_header, body] = parts.as_slice() else {
        return Err(StorageError::decode_failed(format!(
            "expected 2 comma-separated parts, got {}",
            parts.len()
        )));
    };

    STANDARD
        .decode(body.trim())
        .map_err(|e| StorageError::decode_failed(format!("invalid base64 body: {e}")))
}

/// Timestamp-keyed handle with a random suffix.
fn new_handle(extension: &str) -> String {
    let now = Utc::now();
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{:06}_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        now.timestamp_subsec_micros(),
        &suffix[..8],
        extension
    )
}

fn extension_for(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Reject anything that is not a bare file name inside the store.
fn validate_handle(handle: &str) -> StorageResult<()> {
    let valid = !handle.is_empty()
        && !handle.starts_with('.')
        && !handle.contains("..")
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::invalid_handle(handle))
    }
}

/// Directory-backed frame store.
#[derive(Debug, Clone)]
pub struct FrameStore {
    root: PathBuf,
}

impl FrameStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decode a data-URL payload, persist it and return the frame.
    ///
    /// Bytes that are valid base64 but not a decodable image are still
    /// persisted; the returned frame then has no raster.
    pub async fn ingest(&self, payload: &str) -> StorageResult<Frame> {
        let bytes = decode_payload(payload)?;
        let handle = new_handle(extension_for(&bytes));

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&handle), &bytes).await?;

        let frame = Frame::decode(handle, &bytes);
        info!(
            handle = frame.handle(),
            bytes = bytes.len(),
            readable = frame.is_readable(),
            "Frame stored"
        );
        Ok(frame)
    }

    /// Resolve a previously issued handle back to a frame.
    pub async fn load(&self, handle: &str) -> StorageResult<Frame> {
        validate_handle(handle)?;

        let path = self.root.join(handle);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(handle));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(handle, bytes = bytes.len(), "Frame loaded");
        Ok(Frame::decode(handle, &bytes))
    }
}
