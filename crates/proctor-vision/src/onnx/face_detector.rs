//! Short-range BlazeFace detector producing face boxes for the mesh stage.
//!
//! The model takes a 128x128 RGB input scaled to [-1, 1] (NHWC) and emits
//! 896 anchor-relative boxes (`regressors`, 16 values each) with one logit
//! per anchor (`classificators`).

use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use image::RgbImage;
use ort::session::Session;
use tracing::{debug, info};

use super::session::{create_session, extract, tensor};
use super::suppress_overlaps;
use crate::error::{VisionError, VisionResult};
use crate::providers::BoundingBox;

const INPUT_SIZE: u32 = 128;
const NUM_ANCHORS: usize = 896;
const REGRESSOR_WIDTH: usize = 16;
const SCORE_THRESHOLD: f32 = 0.5;
const NMS_THRESHOLD: f32 = 0.3;
const SCORE_CLIP: f32 = 100.0;
const REGRESSORS_OUTPUT: &str = "regressors";
const SCORES_OUTPUT: &str = "classificators";

/// Anchor centre in normalized input coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub cx: f32,
    pub cy: f32,
}

/// Face box with detector confidence, normalized to the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub bbox: BoundingBox,
    pub score: f32,
}

/// Generate the 896 SSD anchors for the short-range model.
///
/// Layer strides are 8, 16, 16, 16; consecutive layers with the same stride
/// share one grid, giving 2 anchors per cell on the 16x16 grid and 6 on the
/// 8x8 grid.
pub fn generate_anchors() -> Vec<Anchor> {
    const STRIDES: [u32; 4] = [8, 16, 16, 16];

    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    let mut layer = 0;
    while layer < STRIDES.len() {
        let stride = STRIDES[layer];
        let mut per_cell = 0;
        while layer < STRIDES.len() && STRIDES[layer] == stride {
            per_cell += 2;
            layer += 1;
        }

        let grid = INPUT_SIZE / stride;
        for y in 0..grid {
            for x in 0..grid {
                let anchor = Anchor {
                    cx: (x as f32 + 0.5) / grid as f32,
                    cy: (y as f32 + 0.5) / grid as f32,
                };
                anchors.extend(std::iter::repeat(anchor).take(per_cell));
            }
        }
    }
    anchors
}

fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit.clamp(-SCORE_CLIP, SCORE_CLIP)).exp())
}

/// Decode raw model outputs into face boxes, highest score first.
pub fn decode_faces(
    anchors: &[Anchor],
    regressors: &[f32],
    logits: &[f32],
) -> VisionResult<Vec<FaceBox>> {
    if regressors.len() != anchors.len() * REGRESSOR_WIDTH || logits.len() != anchors.len() {
        return Err(VisionError::detection_failed(format!(
            "Unexpected face detector output: {} regressors, {} scores for {} anchors",
            regressors.len(),
            logits.len(),
            anchors.len()
        )));
    }

    let scale = INPUT_SIZE as f32;
    let mut candidates = Vec::new();
    for (i, anchor) in anchors.iter().enumerate() {
        let score = sigmoid(logits[i]);
        if score < SCORE_THRESHOLD {
            continue;
        }

        let raw = &regressors[i * REGRESSOR_WIDTH..i * REGRESSOR_WIDTH + 4];
        let cx = raw[0] / scale + anchor.cx;
        let cy = raw[1] / scale + anchor.cy;
        let (w, h) = (raw[2] / scale, raw[3] / scale);

        candidates.push(FaceBox {
            bbox: BoundingBox::new(cx - w / 2.0, cy - h / 2.0, w, h),
            score,
        });
    }

    Ok(suppress_overlaps(
        candidates,
        |f| f.score,
        |a, b| a.bbox.iou(&b.bbox) > NMS_THRESHOLD,
    ))
}

/// BlazeFace ONNX wrapper.
pub struct FaceDetector {
    session: Mutex<Session>,
    anchors: Vec<Anchor>,
}

impl FaceDetector {
    pub fn load(model_path: impl AsRef<Path>) -> VisionResult<Self> {
        let model_path = model_path.as_ref();
        let session = create_session(model_path, "face detection")?;
        info!(model_path = %model_path.display(), "Face detector initialized");
        Ok(Self {
            session: Mutex::new(session),
            anchors: generate_anchors(),
        })
    }

    /// Detect faces, highest score first.
    pub fn detect(&self, image: &RgbImage) -> VisionResult<Vec<FaceBox>> {
        let resized = image::imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let side = INPUT_SIZE as usize;
        let data = resized
            .as_raw()
            .iter()
            .map(|&v| v as f32 / 127.5 - 1.0)
            .collect();
        let input = tensor(vec![1, side, side, 3], data)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::internal("Face detector session poisoned"))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| VisionError::detection_failed(format!("Face detector run failed: {e}")))?;

        let (_, regressors) = extract(outputs.get(REGRESSORS_OUTPUT), REGRESSORS_OUTPUT)?;
        let (_, logits) = extract(outputs.get(SCORES_OUTPUT), SCORES_OUTPUT)?;

        let faces = decode_faces(&self.anchors, &regressors, &logits)?;
        debug!(faces = faces.len(), "Face detection completed");
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_layout() {
        let anchors = generate_anchors();
        assert_eq!(anchors.len(), NUM_ANCHORS);

        // 16x16 grid, two per cell
        assert_eq!(anchors[0], Anchor { cx: 0.5 / 16.0, cy: 0.5 / 16.0 });
        assert_eq!(anchors[1], anchors[0]);
        assert_eq!(anchors[2].cx, 1.5 / 16.0);

        // 8x8 grid, six per cell
        assert_eq!(anchors[512], Anchor { cx: 0.5 / 8.0, cy: 0.5 / 8.0 });
        assert_eq!(anchors[517], anchors[512]);
        assert_eq!(anchors[518].cx, 1.5 / 8.0);
    }

    #[test]
    fn test_decode_single_face() {
        let anchors = generate_anchors();
        let mut regressors = vec![0.0; NUM_ANCHORS * REGRESSOR_WIDTH];
        let mut logits = vec![-10.0; NUM_ANCHORS];

        // anchor 600 lies on the 8x8 grid
        let i = 600;
        regressors[i * REGRESSOR_WIDTH] = 6.4;
        regressors[i * REGRESSOR_WIDTH + 2] = 32.0;
        regressors[i * REGRESSOR_WIDTH + 3] = 32.0;
        logits[i] = 3.0;

        let faces = decode_faces(&anchors, &regressors, &logits).unwrap();
        assert_eq!(faces.len(), 1);
        let face = faces[0];
        assert!(face.score > 0.9);
        assert!((face.bbox.width - 0.25).abs() < 1e-6);
        let cx = face.bbox.x + face.bbox.width / 2.0;
        assert!((cx - (anchors[i].cx + 0.05)).abs() < 1e-6);
    }

    #[test]
    fn test_decode_merges_duplicate_anchors() {
        let anchors = generate_anchors();
        let mut regressors = vec![0.0; NUM_ANCHORS * REGRESSOR_WIDTH];
        let mut logits = vec![-10.0; NUM_ANCHORS];
        for (i, logit) in [(512, 2.0), (513, 4.0)] {
            regressors[i * REGRESSOR_WIDTH + 2] = 40.0;
            regressors[i * REGRESSOR_WIDTH + 3] = 40.0;
            logits[i] = logit;
        }

        let faces = decode_faces(&anchors, &regressors, &logits).unwrap();
        assert_eq!(faces.len(), 1);
        assert!((faces[0].score - sigmoid(4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_decode_rejects_mismatched_outputs() {
        let anchors = generate_anchors();
        assert!(decode_faces(&anchors, &[0.0; 16], &[0.0; 1]).is_err());
    }
}
