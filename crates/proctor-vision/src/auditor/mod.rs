//! Environment checks on a single frame.
//!
//! | Check | Capability | Violation |
//! |-------|------------|-----------|
//! | Multiple faces | `LandmarkProvider` (up to `max_faces`) | more than one face |
//! | Prohibited item | `ObjectDetector`, then ear heuristic | first matching category |
//! | Gaze | `LandmarkProvider` (one face) | average ratio outside the band |
//!
//! All checks fail open: a detector error or unreadable frame yields
//! [`DetectionOutcome::DetectorUnavailable`], never a violation.

pub mod ear_heuristic;
pub mod gaze;

use std::sync::Arc;

use tracing::{debug, warn};

use proctor_models::ItemCategory;

use crate::config::ThresholdConfig;
use crate::error::VisionResult;
use crate::frame::Frame;
use crate::outcome::{DetectionOutcome, FindingKind};
use crate::providers::{LandmarkProvider, ObjectDetector};

pub use ear_heuristic::{detect_ear_accessory, ear_positions};
pub use gaze::{gaze_ratio, is_looking_away};

/// Runs the environment checks against shared detector capabilities.
pub struct EnvironmentAuditor {
    landmarks: Arc<dyn LandmarkProvider>,
    objects: Arc<dyn ObjectDetector>,
    thresholds: ThresholdConfig,
}

impl EnvironmentAuditor {
    pub fn new(
        landmarks: Arc<dyn LandmarkProvider>,
        objects: Arc<dyn ObjectDetector>,
        thresholds: ThresholdConfig,
    ) -> Self {
        Self {
            landmarks,
            objects,
            thresholds,
        }
    }

    /// Number of faces in the frame, capped at `max_faces`.
    pub fn count_faces(&self, frame: &Frame) -> VisionResult<usize> {
        let image = frame.raster()?;
        Ok(self
            .landmarks
            .landmarks(image, self.thresholds.max_faces)?
            .len())
    }

    /// Violation when more than one face is visible.
    pub fn check_multiple_faces(&self, frame: &Frame) -> DetectionOutcome {
        match self.count_faces(frame) {
            Ok(count) if count > 1 => DetectionOutcome::violation(
                FindingKind::MultipleFaces { count },
                format!("{count} faces in frame"),
            ),
            Ok(_) => DetectionOutcome::Ok,
            Err(e) => {
                warn!(error = %e, provider = self.landmarks.name(), "Face count unavailable");
                DetectionOutcome::unavailable(e.to_string())
            }
        }
    }

    /// Violation when a prohibited item is classified, or an accessory is
    /// inferred next to an ear.
    pub fn check_prohibited_items(&self, frame: &Frame) -> DetectionOutcome {
        let image = match frame.raster() {
            Ok(image) => image,
            Err(e) => return DetectionOutcome::unavailable(e.to_string()),
        };

        let mut failures = Vec::new();

        match self.classified_item(frame) {
            Ok(Some((category, label, confidence))) => {
                return DetectionOutcome::violation(
                    FindingKind::ProhibitedItem(category),
                    format!("{label} ({confidence:.2})"),
                );
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, detector = self.objects.name(), "Object detection failed, trying ear heuristic");
                failures.push(e.to_string());
            }
        }

        match self.landmarks.landmarks(image, 1) {
            Ok(faces) => {
                let ears = faces
                    .first()
                    .map(|face| ear_positions(face, image.width(), image.height()))
                    .unwrap_or_default();
                if detect_ear_accessory(image, &ears, &self.thresholds) {
                    return DetectionOutcome::violation(
                        FindingKind::ProhibitedItem(ItemCategory::Earphone),
                        "accessory blob near ear",
                    );
                }
            }
            Err(e) => {
                warn!(error = %e, provider = self.landmarks.name(), "Ear landmarks unavailable");
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            DetectionOutcome::Ok
        } else {
            DetectionOutcome::unavailable(failures.join("; "))
        }
    }

    /// First detection, in detector order, whose label maps to a category.
    fn classified_item(&self, frame: &Frame) -> VisionResult<Option<(ItemCategory, String, f32)>> {
        let floor = self.thresholds.object_confidence;
        let detections = self.objects.detect(frame.raster()?, floor)?;
        debug!(count = detections.len(), "Object detections");

        Ok(detections
            .into_iter()
            .filter(|d| d.confidence >= floor)
            .find_map(|d| ItemCategory::from_label(&d.label).map(|c| (c, d.label, d.confidence))))
    }

    /// Violation when the primary face looks away from the screen.
    ///
    /// A frame without a face is not a gaze violation.
    pub fn check_gaze(&self, frame: &Frame) -> DetectionOutcome {
        let faces = match frame
            .raster()
            .and_then(|image| self.landmarks.landmarks(image, 1))
        {
            Ok(faces) => faces,
            Err(e) => {
                warn!(error = %e, provider = self.landmarks.name(), "Gaze landmarks unavailable");
                return DetectionOutcome::unavailable(e.to_string());
            }
        };

        let Some(face) = faces.first() else {
            debug!(handle = frame.handle(), "No face for gaze check");
            return DetectionOutcome::Ok;
        };

        let ratio = gaze_ratio(face);
        if is_looking_away(ratio, self.thresholds.gaze_lower, self.thresholds.gaze_upper) {
            DetectionOutcome::violation(FindingKind::Gaze { ratio }, format!("gaze ratio {ratio:.3}"))
        } else {
            DetectionOutcome::Ok
        }
    }
}
