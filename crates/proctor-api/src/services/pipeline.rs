//! Capture decision protocol.
//!
//! ```text
//! capture:  multi-face -> [enrollment stops here] -> identity -> terminated? -> prohibited item -> gaze -> noise
//! events:   ledger.record
//! presence: face count -> identity (when a reference is given)
//! ```
//!
//! Every method here is synchronous and may run detector inference; callers
//! on the async runtime use `spawn_blocking`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use proctor_models::{ProctorResponse, ViolationKind};
use proctor_vision::{
    DetectionOutcome, EnvironmentAuditor, FaceAuthenticator, FindingKind, Frame, LandmarkProvider,
    ObjectDetector, ThresholdConfig,
};

use crate::metrics;
use crate::services::ViolationLedger;

/// Orchestrates the identity and environment checks and the ledger.
pub struct ProctorPipeline {
    authenticator: FaceAuthenticator,
    auditor: EnvironmentAuditor,
    ledger: Arc<ViolationLedger>,
}

impl ProctorPipeline {
    pub fn new(
        landmarks: Arc<dyn LandmarkProvider>,
        objects: Arc<dyn ObjectDetector>,
        thresholds: ThresholdConfig,
        ledger: Arc<ViolationLedger>,
    ) -> Self {
        Self {
            authenticator: FaceAuthenticator::new(Arc::clone(&landmarks), thresholds.clone()),
            auditor: EnvironmentAuditor::new(landmarks, objects, thresholds),
            ledger,
        }
    }

    pub fn ledger(&self) -> &ViolationLedger {
        &self.ledger
    }

    /// Evaluate one webcam frame.
    ///
    /// Without a reference the call is an enrollment: only the multi-face
    /// check runs and the ledger is never touched.
    pub fn capture(
        &self,
        user: &str,
        frame: &Frame,
        reference: Option<&Frame>,
        noisy: bool,
    ) -> ProctorResponse {
        let response = self.evaluate_capture(user, frame, reference, noisy);
        metrics::record_decision("capture", response.label());
        info!(user, handle = frame.handle(), response = %response, "Capture evaluated");
        response
    }

    fn evaluate_capture(
        &self,
        user: &str,
        frame: &Frame,
        reference: Option<&Frame>,
        noisy: bool,
    ) -> ProctorResponse {
        let faces = self.auditor.check_multiple_faces(frame);
        note_unavailable("multiple_faces", &faces);
        if faces.is_violation() {
            return ProctorResponse::MultipleFaces;
        }

        let Some(reference) = reference else {
            debug!(user, "Enrollment frame accepted");
            return ProctorResponse::Ok;
        };

        if let DetectionOutcome::Terminal { .. } = self.authenticator.verify(reference, frame) {
            warn!(user, reference = reference.handle(), "Face mismatch");
            return ProctorResponse::FaceMismatch;
        }

        if self.ledger.state(user).is_terminal() {
            debug!(user, "Capture from terminated user");
            return ProctorResponse::MaxViolations;
        }

        let items = self.auditor.check_prohibited_items(frame);
        note_unavailable("prohibited_item", &items);
        if let DetectionOutcome::Violation {
            kind: FindingKind::ProhibitedItem(category),
            detail,
        } = &items
        {
            debug!(user, %category, detail = %detail, "Prohibited item found");
            return self.record(user, ViolationKind::ProhibitedItem(*category));
        }

        let gaze = self.auditor.check_gaze(frame);
        note_unavailable("gaze", &gaze);
        if gaze.is_violation() {
            return self.record(user, ViolationKind::Gaze);
        }

        if noisy {
            return self.record(user, ViolationKind::Noise);
        }

        ProctorResponse::Ok
    }

    /// Record a client-reported browser event.
    pub fn report_event(&self, user: &str, kind: ViolationKind) -> ProctorResponse {
        let response = self.record(user, kind);
        metrics::record_decision("event", response.label());
        response
    }

    /// Presence check, plus identity when a reference is given.
    ///
    /// Never touches the ledger.
    pub fn validate_face(&self, frame: &Frame, reference: Option<&Frame>) -> ProctorResponse {
        let faces = match self.auditor.count_faces(frame) {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, handle = frame.handle(), "Face presence unavailable");
                metrics::record_detector_unavailable("presence");
                0
            }
        };

        let response = match (faces, reference) {
            (0, _) => ProctorResponse::NoFaceDetected,
            (_, None) => ProctorResponse::FaceDetected,
            (_, Some(reference)) if self.authenticator.matches(reference, frame) => {
                ProctorResponse::FaceMatch
            }
            (_, Some(_)) => ProctorResponse::NoFaceMatch,
        };
        metrics::record_decision("validate_face", response.label());
        response
    }

    fn record(&self, user: &str, kind: ViolationKind) -> ProctorResponse {
        let entry = self.ledger.record(user, kind);
        if entry.terminal {
            ProctorResponse::MaxViolations
        } else {
            ProctorResponse::Violation {
                kind,
                count: entry.count,
            }
        }
    }
}

fn note_unavailable(stage: &str, outcome: &DetectionOutcome) {
    if let DetectionOutcome::DetectorUnavailable { reason } = outcome {
        warn!(stage, reason = %reason, "Detector unavailable, treating as no detection");
        metrics::record_detector_unavailable(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use proctor_models::ItemCategory;
    use proctor_vision::{BoundingBox, LandmarkSet, ObjectDetection, Point, VisionError, VisionResult};

    struct FixedFaces(usize);

    impl LandmarkProvider for FixedFaces {
        fn landmarks(&self, _: &RgbImage, max_faces: usize) -> VisionResult<Vec<LandmarkSet>> {
            Ok(vec![LandmarkSet::new(vec![Point::new(0.5, 0.5); 468]); self.0.min(max_faces)])
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingFaces;

    impl LandmarkProvider for FailingFaces {
        fn landmarks(&self, _: &RgbImage, _: usize) -> VisionResult<Vec<LandmarkSet>> {
            Err(VisionError::detection_failed("offline"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct FixedObjects(Vec<&'static str>);

    impl ObjectDetector for FixedObjects {
        fn detect(&self, _: &RgbImage, _: f32) -> VisionResult<Vec<ObjectDetection>> {
            Ok(self
                .0
                .iter()
                .map(|label| ObjectDetection {
                    label: label.to_string(),
                    confidence: 0.8,
                    bbox: BoundingBox::new(0.1, 0.1, 0.2, 0.2),
                })
                .collect())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    /// Flat skin tone: no accessory blobs, identity falls through to geometry.
    fn frame(name: &str) -> Frame {
        Frame::from_image(name, RgbImage::from_pixel(32, 24, Rgb([180, 140, 120])))
    }

    fn textured(name: &str) -> Frame {
        Frame::from_image(
            name,
            RgbImage::from_fn(32, 24, |x, y| {
                let v = ((x * 37 + y * 91 + x * y * 7) % 251) as u8;
                Rgb([v, v, v])
            }),
        )
    }

    fn pipeline(
        landmarks: impl LandmarkProvider + 'static,
        objects: Vec<&'static str>,
        threshold: u64,
    ) -> ProctorPipeline {
        ProctorPipeline::new(
            Arc::new(landmarks),
            Arc::new(FixedObjects(objects)),
            ThresholdConfig::default(),
            Arc::new(ViolationLedger::new(threshold)),
        )
    }

    #[test]
    fn test_enrollment_never_touches_ledger() {
        let p = pipeline(FixedFaces(2), vec!["cell phone"], 10);
        assert_eq!(p.capture("alice", &frame("a"), None, true), ProctorResponse::MultipleFaces);

        let p = pipeline(FixedFaces(1), vec!["cell phone"], 10);
        assert_eq!(p.capture("alice", &frame("a"), None, true), ProctorResponse::Ok);
        assert_eq!(p.ledger().count("alice"), 0);
    }

    #[test]
    fn test_prohibited_item_is_counted() {
        let p = pipeline(FixedFaces(1), vec!["cell phone"], 10);
        let reference = frame("ref");
        let response = p.capture("gina", &frame("cur"), Some(&reference), false);
        assert_eq!(
            response,
            ProctorResponse::Violation {
                kind: ViolationKind::ProhibitedItem(ItemCategory::MobilePhone),
                count: 1
            }
        );
        assert_eq!(response.to_string(), "VIOLATION:PROHIBITED_ITEM:MOBILE_PHONE:1");
    }

    #[test]
    fn test_face_mismatch_never_counts() {
        let p = pipeline(FixedFaces(1), vec!["cell phone"], 10);
        let reference = frame("ref");
        let unreadable = Frame::decode("cur.bin", b"not an image");
        assert_eq!(
            p.capture("hank", &unreadable, Some(&reference), true),
            ProctorResponse::FaceMismatch
        );
        assert_eq!(p.ledger().count("hank"), 0);
    }

    #[test]
    fn test_noise_flag_and_termination() {
        let p = pipeline(FixedFaces(1), vec![], 2);
        let reference = frame("ref");
        let current = frame("cur");

        assert_eq!(p.capture("ivy", &current, Some(&reference), false), ProctorResponse::Ok);
        assert_eq!(
            p.capture("ivy", &current, Some(&reference), true).to_string(),
            "VIOLATION:NOISE_VIOLATION:1"
        );
        assert_eq!(
            p.capture("ivy", &current, Some(&reference), true),
            ProctorResponse::MaxViolations
        );
        assert_eq!(p.report_event("ivy", ViolationKind::TabChange), ProctorResponse::MaxViolations);
    }

    #[test]
    fn test_terminated_user_clean_frame_stays_terminal() {
        let p = pipeline(FixedFaces(1), vec![], 3);
        let reference = frame("ref");
        let current = frame("cur");
        for _ in 0..3 {
            p.report_event("kate", ViolationKind::WindowChange);
        }

        assert_eq!(
            p.capture("kate", &current, Some(&reference), false),
            ProctorResponse::MaxViolations
        );
        assert_eq!(p.ledger().count("kate"), 3);

        // Identity still comes first.
        let unreadable = Frame::decode("cur.bin", b"not an image");
        assert_eq!(
            p.capture("kate", &unreadable, Some(&reference), false),
            ProctorResponse::FaceMismatch
        );
    }

    #[test]
    fn test_detector_failure_fails_open_for_environment() {
        let p = pipeline(FailingFaces, vec![], 10);
        // Identity still passes through the appearance tier.
        let current = textured("cur");
        assert_eq!(p.capture("jack", &current, Some(&current), false), ProctorResponse::Ok);
        assert_eq!(p.ledger().count("jack"), 0);
    }

    #[test]
    fn test_validate_face() {
        let p = pipeline(FixedFaces(0), vec![], 10);
        assert_eq!(p.validate_face(&frame("a"), None), ProctorResponse::NoFaceDetected);

        let p = pipeline(FixedFaces(1), vec![], 10);
        let current = frame("cur");
        assert_eq!(p.validate_face(&current, None), ProctorResponse::FaceDetected);
        assert_eq!(p.validate_face(&current, Some(&current)), ProctorResponse::FaceMatch);
        let unreadable = Frame::decode("ref.bin", b"zz");
        assert_eq!(p.validate_face(&current, Some(&unreadable)), ProctorResponse::NoFaceMatch);

        let p = pipeline(FailingFaces, vec![], 10);
        assert_eq!(p.validate_face(&current, None), ProctorResponse::NoFaceDetected);
    }
}
