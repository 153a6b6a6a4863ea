//! Two-tier identity comparison against the enrollment frame.
//!
//! 1. Appearance: normalized cross-correlation of the intensity images. A
//!    score at or above the appearance threshold matches immediately.
//! 2. Geometry: mean distance between seven key landmarks of the primary
//!    face in each frame. Only runs when appearance is inconclusive.
//!
//! Every failure along the way (unreadable frame, provider error, missing
//! face, missing key point) is a non-match.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ThresholdConfig;
use crate::frame::Frame;
use crate::imaging::{appearance_correlation, to_intensity};
use crate::outcome::{DetectionOutcome, TerminalKind};
use crate::providers::LandmarkProvider;

/// Identity comparator.
pub struct FaceAuthenticator {
    landmarks: Arc<dyn LandmarkProvider>,
    thresholds: ThresholdConfig,
}

impl FaceAuthenticator {
    pub fn new(landmarks: Arc<dyn LandmarkProvider>, thresholds: ThresholdConfig) -> Self {
        Self {
            landmarks,
            thresholds,
        }
    }

    /// Whether `current` shows the same person as `reference`.
    pub fn matches(&self, reference: &Frame, current: &Frame) -> bool {
        let (reference_img, current_img) = match (reference.raster(), current.raster()) {
            (Ok(r), Ok(c)) => (r, c),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Identity check on unreadable frame, treating as mismatch");
                return false;
            }
        };

        let score = self.appearance_score(reference, current);
        if score >= self.thresholds.appearance_threshold {
            debug!(score, "Appearance match");
            return true;
        }

        let reference_face = match self.landmarks.landmarks(reference_img, 1) {
            Ok(mut faces) if !faces.is_empty() => faces.swap_remove(0),
            Ok(_) => {
                debug!(handle = reference.handle(), "No face in reference frame");
                return false;
            }
            Err(e) => {
                warn!(error = %e, provider = self.landmarks.name(), "Landmark extraction failed on reference");
                return false;
            }
        };

        let current_face = match self.landmarks.landmarks(current_img, 1) {
            Ok(mut faces) if !faces.is_empty() => faces.swap_remove(0),
            Ok(_) => {
                debug!(handle = current.handle(), "No face in current frame");
                return false;
            }
            Err(e) => {
                warn!(error = %e, provider = self.landmarks.name(), "Landmark extraction failed on current frame");
                return false;
            }
        };

        match reference_face.mean_key_feature_distance(&current_face) {
            Some(distance) => {
                debug!(score, distance, "Geometry comparison");
                distance < self.thresholds.geometry_threshold
            }
            None => {
                debug!("Key landmarks missing, treating as mismatch");
                false
            }
        }
    }

    /// Identity stage of the capture protocol.
    pub fn verify(&self, reference: &Frame, current: &Frame) -> DetectionOutcome {
        if self.matches(reference, current) {
            DetectionOutcome::Ok
        } else {
            DetectionOutcome::Terminal {
                kind: TerminalKind::FaceMismatch,
            }
        }
    }

    /// Best correlation of `current` against `reference` as the template.
    ///
    /// Unreadable frames score 0.0.
    pub fn appearance_score(&self, reference: &Frame, current: &Frame) -> f64 {
        match (reference.raster(), current.raster()) {
            (Ok(r), Ok(c)) => appearance_correlation(&to_intensity(c), &to_intensity(r)),
            _ => 0.0,
        }
    }
}
