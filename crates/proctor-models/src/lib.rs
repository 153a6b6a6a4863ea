//! Shared data models for the proctoring core.
//!
//! This crate provides:
//! - The literal response token protocol spoken to exam clients
//! - Violation kinds and prohibited-item categories
//! - Ledger states for operator inspection
//! - Exam result records

pub mod exam_result;
pub mod response;
pub mod violation;

pub use exam_result::ExamResult;
pub use response::ProctorResponse;
pub use violation::{ItemCategory, LedgerState, ViolationKind};
