//! Per-stage results of the frame checks.

use proctor_models::ItemCategory;

/// What an environment stage found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FindingKind {
    /// More than one face in frame.
    MultipleFaces { count: usize },
    /// Prohibited item, either classified or inferred near an ear.
    ProhibitedItem(ItemCategory),
    /// Eyes turned away from the screen.
    Gaze { ratio: f64 },
}

/// Outcome that stops processing of the current frame outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    FaceMismatch,
}

/// Tagged result returned by every check.
///
/// `DetectorUnavailable` is the explicit fail-open case for environment
/// checks: the caller treats it exactly like `Ok` but can log and count it.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    Ok,
    Violation { kind: FindingKind, detail: String },
    Terminal { kind: TerminalKind },
    DetectorUnavailable { reason: String },
}

impl DetectionOutcome {
    pub fn violation(kind: FindingKind, detail: impl Into<String>) -> Self {
        Self::Violation {
            kind,
            detail: detail.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::DetectorUnavailable {
            reason: reason.into(),
        }
    }

    pub fn is_violation(&self) -> bool {
        matches!(self, DetectionOutcome::Violation { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, DetectionOutcome::DetectorUnavailable { .. })
    }
}
