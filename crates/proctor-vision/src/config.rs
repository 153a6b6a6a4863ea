//! Detector thresholds and model locations.

use serde::{Deserialize, Serialize};

/// Numeric thresholds used by the identity and environment checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    // === Identity ===
    /// Minimum appearance correlation for the fast-path match (default: 0.7)
    pub appearance_threshold: f64,

    /// Mean key-point distance below which geometry matches (default: 0.1)
    pub geometry_threshold: f64,

    // === Gaze ===
    /// Average gaze ratio at or below this violates (default: 0.35)
    pub gaze_lower: f64,

    /// Average gaze ratio at or above this violates (default: 0.65)
    pub gaze_upper: f64,

    // === Prohibited items ===
    /// Confidence floor for object detections (default: 0.5)
    pub object_confidence: f32,

    /// Blob area lower bound in px², exclusive (default: 50)
    pub blob_min_area: usize,

    /// Blob area upper bound in px², exclusive (default: 500)
    pub blob_max_area: usize,

    /// Blob centroid distance to an ear that counts as worn, exclusive (default: 70)
    pub ear_radius_px: f64,

    // === Faces ===
    /// Faces requested from the landmark provider for the multi-face check (default: 5)
    pub max_faces: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            appearance_threshold: 0.7,
            geometry_threshold: 0.1,
            gaze_lower: 0.35,
            gaze_upper: 0.65,
            object_confidence: 0.5,
            blob_min_area: 50,
            blob_max_area: 500,
            ear_radius_px: 70.0,
            max_faces: 5,
        }
    }
}

impl ThresholdConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            appearance_threshold: env_or("APPEARANCE_THRESHOLD", defaults.appearance_threshold),
            geometry_threshold: env_or("GEOMETRY_THRESHOLD", defaults.geometry_threshold),
            gaze_lower: env_or("GAZE_LOWER", defaults.gaze_lower),
            gaze_upper: env_or("GAZE_UPPER", defaults.gaze_upper),
            object_confidence: env_or("OBJECT_CONFIDENCE", defaults.object_confidence),
            blob_min_area: env_or("BLOB_MIN_AREA", defaults.blob_min_area),
            blob_max_area: env_or("BLOB_MAX_AREA", defaults.blob_max_area),
            ear_radius_px: env_or("EAR_RADIUS_PX", defaults.ear_radius_px),
            max_faces: env_or("MAX_FACES", defaults.max_faces),
        }
    }
}

/// Locations of the ONNX models backing the production providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Short-range face detector (128x128 input, 896 anchors)
    pub face_detector_path: String,
    /// Face mesh landmark model (192x192 input)
    pub face_mesh_path: String,
    /// YOLOv8 COCO object detector (640x640 input)
    pub object_detector_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_detector_path: "models/face_detection/face_detection_short_range.onnx".to_string(),
            face_mesh_path: "models/face_mesh/face_landmark_with_attention.onnx".to_string(),
            object_detector_path: "models/object_detection/yolov8n.onnx".to_string(),
        }
    }
}

impl ModelConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            face_detector_path: std::env::var("FACE_DETECTOR_MODEL")
                .unwrap_or(defaults.face_detector_path),
            face_mesh_path: std::env::var("FACE_MESH_MODEL").unwrap_or(defaults.face_mesh_path),
            object_detector_path: std::env::var("OBJECT_DETECTOR_MODEL")
                .unwrap_or(defaults.object_detector_path),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_defaults() {
        let config = ThresholdConfig::default();
        assert!((config.appearance_threshold - 0.7).abs() < 1e-9);
        assert!((config.geometry_threshold - 0.1).abs() < 1e-9);
        assert!((config.gaze_lower - 0.35).abs() < 1e-9);
        assert!((config.gaze_upper - 0.65).abs() < 1e-9);
        assert!((config.object_confidence - 0.5).abs() < 1e-6);
        assert_eq!(config.blob_min_area, 50);
        assert_eq!(config.blob_max_area, 500);
        assert!((config.ear_radius_px - 70.0).abs() < 1e-9);
        assert_eq!(config.max_faces, 5);
    }
}
