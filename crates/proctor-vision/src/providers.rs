//! Capability traits wrapping the landmark and object models.
//!
//! The checks only see these traits, so models are constructed once at
//! startup and shared, and tests substitute doubles.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::VisionResult;
use crate::landmarks::LandmarkSet;

/// Facial landmark extraction.
#[cfg_attr(test, mockall::automock)]
pub trait LandmarkProvider: Send + Sync {
    /// Detect up to `max_faces` faces, most prominent first.
    ///
    /// An empty vector means no face was found.
    fn landmarks(&self, image: &RgbImage, max_faces: usize) -> VisionResult<Vec<LandmarkSet>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Axis-aligned box in normalized coordinates [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// One classified object in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Generic object classification.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectDetector: Send + Sync {
    /// Detect objects with confidence at or above `min_confidence`.
    ///
    /// Results are in the detector's own order; the ONNX detector sorts by
    /// descending confidence.
    fn detect(&self, image: &RgbImage, min_confidence: f32) -> VisionResult<Vec<ObjectDetection>>;

    /// Detector name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_and_disjoint() {
        let a = BoundingBox::new(0.1, 0.1, 0.2, 0.2);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);

        let b = BoundingBox::new(0.5, 0.5, 0.2, 0.2);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_half_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 0.2, 0.2);
        let b = BoundingBox::new(0.1, 0.0, 0.2, 0.2);
        // intersection 0.02, union 0.06
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-5);
    }
}
