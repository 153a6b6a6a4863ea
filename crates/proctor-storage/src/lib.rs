//! Frame storage for the proctoring service.
//!
//! This crate provides:
//! - Data-URL payload decoding (`<header>,<base64 body>`)
//! - Persistence under collision-free, timestamp-keyed handles
//! - Handle resolution back to decoded frames, confined to the capture directory

pub mod error;
pub mod frame_store;

pub use error::{StorageError, StorageResult};
pub use frame_store::{decode_payload, FrameStore};
