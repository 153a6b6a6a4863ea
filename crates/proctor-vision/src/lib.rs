//! Frame analysis for remote proctoring.
//!
//! This crate provides:
//! - Identity verification against an enrollment frame (appearance, then landmark geometry)
//! - Environment checks: multiple faces, prohibited items, gaze direction
//! - Capability traits for landmark and object models, with ONNX Runtime implementations
//! - Pixel primitives: normalized cross-correlation, HSV masks, connected regions

pub mod auditor;
pub mod authenticator;
pub mod config;
pub mod error;
pub mod frame;
pub mod imaging;
pub mod landmarks;
pub mod onnx;
pub mod outcome;
pub mod providers;

pub use auditor::EnvironmentAuditor;
pub use authenticator::FaceAuthenticator;
pub use config::{ModelConfig, ThresholdConfig};
pub use error::{VisionError, VisionResult};
pub use frame::Frame;
pub use landmarks::{LandmarkSet, Point};
pub use onnx::OnnxProviders;
pub use outcome::{DetectionOutcome, FindingKind, TerminalKind};
pub use providers::{BoundingBox, LandmarkProvider, ObjectDetection, ObjectDetector};
