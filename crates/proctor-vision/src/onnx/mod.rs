//! ONNX Runtime implementations of the detector capabilities.
//!
//! - [`MeshLandmarkProvider`]: face detector + face mesh, implements `LandmarkProvider`
//! - [`YoloDetector`]: YOLOv8 COCO detector, implements `ObjectDetector`
//!
//! Each model owns a `Mutex<Session>`; callers run inference from blocking
//! threads.

pub mod face_detector;
pub mod face_mesh;
pub mod session;
pub mod yolo;

use std::sync::Arc;

use image::RgbImage;
use tracing::warn;

pub use face_detector::{FaceBox, FaceDetector};
pub use face_mesh::FaceMesh;
pub use yolo::{YoloDetector, COCO_CLASSES};

use crate::config::ModelConfig;
use crate::error::VisionResult;
use crate::landmarks::LandmarkSet;
use crate::providers::{LandmarkProvider, ObjectDetector};

/// Greedy non-maximum suppression.
///
/// Sorts by descending `score` and drops every item that `overlaps` an
/// already kept one.
pub(crate) fn suppress_overlaps<T>(
    mut items: Vec<T>,
    score: impl Fn(&T) -> f32,
    overlaps: impl Fn(&T, &T) -> bool,
) -> Vec<T> {
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));

    let mut keep: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !keep.iter().any(|kept| overlaps(kept, &item)) {
            keep.push(item);
        }
    }
    keep
}

/// Landmarks from a face detector followed by the mesh model on each face.
pub struct MeshLandmarkProvider {
    detector: FaceDetector,
    mesh: FaceMesh,
}

impl MeshLandmarkProvider {
    pub fn new(detector: FaceDetector, mesh: FaceMesh) -> Self {
        Self { detector, mesh }
    }
}

impl LandmarkProvider for MeshLandmarkProvider {
    fn landmarks(&self, image: &RgbImage, max_faces: usize) -> VisionResult<Vec<LandmarkSet>> {
        let faces = self.detector.detect(image)?;

        let mut sets = Vec::with_capacity(faces.len().min(max_faces));
        for face in faces.iter().take(max_faces) {
            match self.mesh.landmarks(image, &face.bbox) {
                Ok(set) => sets.push(set),
                // Still counted as a face, with no points.
                Err(e) => {
                    warn!(error = %e, score = face.score, "Face mesh failed for detected face");
                    sets.push(LandmarkSet::new(Vec::new()));
                }
            }
        }
        Ok(sets)
    }

    fn name(&self) -> &'static str {
        "onnx-face-mesh"
    }
}

/// Production detectors, loaded once at startup and shared.
#[derive(Clone)]
pub struct OnnxProviders {
    pub landmarks: Arc<dyn LandmarkProvider>,
    pub objects: Arc<dyn ObjectDetector>,
}

impl OnnxProviders {
    /// Load all three models. Fails if any model file is missing or invalid.
    pub fn load(config: &ModelConfig) -> VisionResult<Self> {
        let detector = FaceDetector::load(&config.face_detector_path)?;
        let mesh = FaceMesh::load(&config.face_mesh_path)?;
        let objects = YoloDetector::load(&config.object_detector_path)?;
        Ok(Self {
            landmarks: Arc::new(MeshLandmarkProvider::new(detector, mesh)),
            objects: Arc::new(objects),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppress_overlaps_keeps_highest() {
        let items = vec![(0, 0.5f32), (1, 0.9), (2, 0.7)];
        // 0 and 1 overlap; 2 is separate
        let kept = suppress_overlaps(items, |i| i.1, |a, b| a.0 + b.0 == 1);
        assert_eq!(kept.iter().map(|i| i.0).collect::<Vec<_>>(), vec![1, 2]);
    }
}
