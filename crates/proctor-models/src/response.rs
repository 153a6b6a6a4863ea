//! Response token protocol.
//!
//! Clients compare response bodies against literal strings, so the
//! `Display` output of [`ProctorResponse`] is the wire format and must stay
//! byte-for-byte stable.

use crate::violation::ViolationKind;

/// Outcome of a proctoring call as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProctorResponse {
    /// All checks passed (or the call was accepted).
    Ok,
    /// More than one face in frame; retake, not counted.
    MultipleFaces,
    /// Frame does not match the reference face; not counted.
    FaceMismatch,
    /// Countable violation with the user's count after recording it.
    Violation { kind: ViolationKind, count: u64 },
    /// User reached the violation threshold.
    MaxViolations,
    NoFaceDetected,
    FaceDetected,
    FaceMatch,
    NoFaceMatch,
    /// Malformed input or internal failure.
    Error,
}

impl ProctorResponse {
    /// Short label for metrics (never includes counts).
    pub fn label(&self) -> &'static str {
        match self {
            ProctorResponse::Ok => "ok",
            ProctorResponse::MultipleFaces => "multiple_faces",
            ProctorResponse::FaceMismatch => "face_mismatch",
            ProctorResponse::Violation { kind, .. } => kind.as_str(),
            ProctorResponse::MaxViolations => "max_violations",
            ProctorResponse::NoFaceDetected => "no_face_detected",
            ProctorResponse::FaceDetected => "face_detected",
            ProctorResponse::FaceMatch => "face_match",
            ProctorResponse::NoFaceMatch => "no_face_match",
            ProctorResponse::Error => "error",
        }
    }
}

impl std::fmt::Display for ProctorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProctorResponse::Ok => f.write_str("OK"),
            ProctorResponse::MultipleFaces => f.write_str("MULTIPLE_FACES"),
            ProctorResponse::FaceMismatch => f.write_str("FACE_MISMATCH"),
            ProctorResponse::Violation {
                kind: kind @ ViolationKind::ProhibitedItem(category),
                count,
            } => write!(f, "VIOLATION:{}:{}:{}", kind.wire_tag(), category, count),
            ProctorResponse::Violation { kind, count } => {
                write!(f, "VIOLATION:{}:{}", kind.wire_tag(), count)
            }
            ProctorResponse::MaxViolations => f.write_str("MAX_VIOLATIONS"),
            ProctorResponse::NoFaceDetected => f.write_str("NO_FACE_DETECTED"),
            ProctorResponse::FaceDetected => f.write_str("FACE_DETECTED"),
            ProctorResponse::FaceMatch => f.write_str("FACE_MATCH"),
            ProctorResponse::NoFaceMatch => f.write_str("NO_FACE_MATCH"),
            ProctorResponse::Error => f.write_str("ERROR"),
        }
    }
}
