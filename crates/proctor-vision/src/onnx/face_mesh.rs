//! Face mesh landmark model run on a square crop around each detected face.
//!
//! Notes:
//! - The crop is the detector box expanded by 25%, squared and clamped to the
//!   frame, then resized to 192x192 and scaled to [-1, 1] (NCHW).
//! - Model outputs are in crop pixels; they are mapped back to the frame with
//!   a center-based transform and normalized to [0, 1].
//! - Iris points, when the model exports them, are appended after the 468
//!   mesh points so the set has 478 entries.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use image::RgbImage;
use ort::session::Session;
use tracing::{debug, info};

use super::session::{create_session, extract, tensor};
use crate::error::{VisionError, VisionResult};
use crate::landmarks::{LandmarkSet, Point, MESH_POINTS};
use crate::providers::BoundingBox;

const INPUT_SIZE: u32 = 192;
const CROP_PADDING: f32 = 0.25;
const MIN_CROP_PX: f32 = 8.0;
const MESH_OUTPUT: &str = "output";
const IRIS_OUTPUTS: [&str; 2] = ["output_right_iris", "output_left_iris"];
const IRIS_POINTS: usize = 5;

/// Square crop in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Expand a normalized face box, square it and clamp it to the frame.
pub fn square_crop(face: &BoundingBox, width: u32, height: u32) -> VisionResult<CropRect> {
    let (fw, fh) = (width as f32, height as f32);
    let (w, h) = (face.width * fw, face.height * fh);
    let size = w.max(h) * (1.0 + CROP_PADDING);

    let center_x = face.x * fw + w / 2.0;
    let center_y = face.y * fh + h / 2.0;

    let mut x = center_x - size / 2.0;
    let mut y = center_y - size / 2.0;
    let mut s = size;

    if x < 0.0 {
        s += x;
        x = 0.0;
    }
    if y < 0.0 {
        s += y;
        y = 0.0;
    }
    if x + s > fw {
        s = fw - x;
    }
    if y + s > fh {
        s = fh - y;
    }

    if s < MIN_CROP_PX {
        return Err(VisionError::detection_failed("Face region too small for mesh"));
    }

    Ok(CropRect {
        x: x.round() as u32,
        y: y.round() as u32,
        size: (s.round() as u32).min(width - x.round() as u32).min(height - y.round() as u32),
    })
}

/// Map a point in crop pixels (0..192) back to normalized frame coordinates.
pub fn crop_to_frame(px: f32, py: f32, crop: &CropRect, width: u32, height: u32) -> Point {
    let size = crop.size as f32;
    let center_x = crop.x as f32 + size / 2.0;
    let center_y = crop.y as f32 + size / 2.0;
    let nx = px / INPUT_SIZE as f32;
    let ny = py / INPUT_SIZE as f32;
    Point::new(
        ((center_x + (nx - 0.5) * size) / width as f32) as f64,
        ((center_y + (ny - 0.5) * size) / height as f32) as f64,
    )
}

/// Read `count` xyz triples (or all if `None`) and map them to the frame.
fn to_points(
    data: &[f32],
    count: Option<usize>,
    crop: &CropRect,
    width: u32,
    height: u32,
) -> VisionResult<Vec<Point>> {
    let available = data.len() / 3;
    let count = count.unwrap_or(available);
    if available < count {
        return Err(VisionError::detection_failed(format!(
            "Face mesh output has {available} points, expected {count}"
        )));
    }
    Ok(data
        .chunks_exact(3)
        .take(count)
        .map(|xyz| crop_to_frame(xyz[0], xyz[1], crop, width, height))
        .collect())
}

/// Face mesh ONNX wrapper.
pub struct FaceMesh {
    session: Mutex<Session>,
}

impl FaceMesh {
    pub fn load(model_path: impl AsRef<Path>) -> VisionResult<Self> {
        let model_path = model_path.as_ref();
        let session = create_session(model_path, "face mesh")?;
        info!(model_path = %model_path.display(), "Face mesh initialized");
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Landmarks for the face inside `face`, normalized to the frame.
    pub fn landmarks(&self, image: &RgbImage, face: &BoundingBox) -> VisionResult<LandmarkSet> {
        let (width, height) = image.dimensions();
        let crop = square_crop(face, width, height)?;

        let patch = image::imageops::crop_imm(image, crop.x, crop.y, crop.size, crop.size).to_image();
        let resized = image::imageops::resize(&patch, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        let side = INPUT_SIZE as usize;
        let mut chw = Vec::with_capacity(3 * side * side);
        for c in 0..3 {
            for pixel in resized.pixels() {
                chw.push(pixel[c] as f32 / 255.0 * 2.0 - 1.0);
            }
        }
        let input = tensor(vec![1, 3, side, side], chw)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::internal("Face mesh session poisoned"))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| VisionError::detection_failed(format!("Face mesh run failed: {e}")))?;

        let (shape, mesh) = extract(outputs.get(MESH_OUTPUT), MESH_OUTPUT)?;
        let mut points = to_points(&mesh, None, &crop, width, height)?;
        if points.len() < MESH_POINTS {
            return Err(VisionError::detection_failed(format!(
                "Unexpected face mesh output shape: {shape:?}"
            )));
        }

        if points.len() == MESH_POINTS {
            for name in IRIS_OUTPUTS {
                if let Some(value) = outputs.get(name) {
                    let (_, iris) = extract(Some(value), name)?;
                    points.extend(to_points(&iris, Some(IRIS_POINTS), &crop, width, height)?);
                }
            }
        }

        debug!(points = points.len(), ?crop, "Face mesh completed");
        Ok(LandmarkSet::new(points))
    }
}
