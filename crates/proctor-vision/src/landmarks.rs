//! Normalized facial landmark sets.
//!
//! Indices follow the 468-point face mesh topology, with the optional
//! refined iris points appended at 468..478:
//!
//! - 1: Nose tip
//! - 33 / 133: Outer / inner corner of the first eye
//! - 362 / 263: Inner / outer corner of the second eye
//! - 61 / 291: Mouth corners
//! - 234 / 454: Face contour next to each ear
//! - 468 / 473: Iris centers (first / second eye)

use serde::{Deserialize, Serialize};

pub const NOSE_TIP: usize = 1;
pub const FIRST_EYE_OUTER: usize = 33;
pub const FIRST_EYE_INNER: usize = 133;
pub const SECOND_EYE_INNER: usize = 362;
pub const SECOND_EYE_OUTER: usize = 263;
pub const MOUTH_LEFT: usize = 61;
pub const MOUTH_RIGHT: usize = 291;
pub const FIRST_EAR: usize = 234;
pub const SECOND_EAR: usize = 454;
pub const FIRST_IRIS: usize = 468;
pub const SECOND_IRIS: usize = 473;

/// Points compared by the geometry tier of face authentication.
pub const KEY_FEATURES: [usize; 7] = [
    NOSE_TIP,
    FIRST_EYE_OUTER,
    FIRST_EYE_INNER,
    SECOND_EYE_INNER,
    SECOND_EYE_OUTER,
    MOUTH_LEFT,
    MOUTH_RIGHT,
];

/// Number of points in the base mesh.
pub const MESH_POINTS: usize = 468;

/// Number of points with refined irises.
pub const REFINED_POINTS: usize = 478;

/// A point in normalized image coordinates ([0, 1] on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Convert to pixel coordinates for a frame of the given size.
    pub fn to_pixels(&self, width: u32, height: u32) -> (f64, f64) {
        (self.x * width as f64, self.y * height as f64)
    }
}

/// Landmarks of one detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Point at `index`, if the model produced it.
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean distance between corresponding key features of two faces.
    ///
    /// Returns `None` when either set lacks one of the key points.
    pub fn mean_key_feature_distance(&self, other: &LandmarkSet) -> Option<f64> {
        let mut total = 0.0;
        for &index in KEY_FEATURES.iter() {
            total += self.get(index)?.distance(&other.get(index)?);
        }
        Some(total / KEY_FEATURES.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(offset: f64) -> LandmarkSet {
        LandmarkSet::new(
            (0..MESH_POINTS)
                .map(|i| Point::new(i as f64 / 1000.0 + offset, 0.5))
                .collect(),
        )
    }

    #[test]
    fn test_key_feature_distance_identical() {
        let a = mesh(0.0);
        assert_eq!(a.mean_key_feature_distance(&a), Some(0.0));
    }

    #[test]
    fn test_key_feature_distance_shifted() {
        let a = mesh(0.0);
        let b = mesh(0.05);
        let d = a.mean_key_feature_distance(&b).unwrap();
        assert!((d - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_key_feature_distance_missing_points() {
        let short = LandmarkSet::new(vec![Point::new(0.5, 0.5); 100]);
        assert_eq!(short.mean_key_feature_distance(&mesh(0.0)), None);
    }

    #[test]
    fn test_to_pixels() {
        let (x, y) = Point::new(0.25, 0.5).to_pixels(640, 480);
        assert!((x - 160.0).abs() < 1e-9);
        assert!((y - 240.0).abs() < 1e-9);
    }
}
