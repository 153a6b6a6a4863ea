//! YOLOv8 COCO object detector.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array;
use ort::session::Session;
use tracing::{debug, info};

use super::session::{create_session, extract, tensor};
use super::suppress_overlaps;
use crate::error::{VisionError, VisionResult};
use crate::providers::{BoundingBox, ObjectDetection, ObjectDetector};

/// COCO class names (80 classes).
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck",
    "boat", "traffic light", "fire hydrant", "stop sign", "parking meter", "bench",
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra",
    "giraffe", "backpack", "umbrella", "handbag", "tie", "suitcase", "frisbee",
    "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
    "skateboard", "surfboard", "tennis racket", "bottle", "wine glass", "cup",
    "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
    "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier",
    "toothbrush",
];

const INPUT_SIZE: u32 = 640;
const NUM_BOXES: usize = 8400;
const NUM_FEATURES: usize = 4 + 80;
const NMS_THRESHOLD: f32 = 0.45;
const OUTPUT_NAME: &str = "output0";

/// Object detector backed by a YOLOv8 ONNX export.
pub struct YoloDetector {
    session: Mutex<Session>,
}

impl YoloDetector {
    /// Load the model. Fails if the file is missing or invalid.
    pub fn load(model_path: impl AsRef<Path>) -> VisionResult<Self> {
        let model_path = model_path.as_ref();
        let session = create_session(model_path, "object detection")?;
        info!(model_path = %model_path.display(), input_size = INPUT_SIZE, "Object detector initialized");
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Resize to 640x640, scale to [0, 1], NCHW.
    fn preprocess(&self, image: &RgbImage) -> VisionResult<ort::value::Value> {
        let resized = image::imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let side = INPUT_SIZE as usize;

        let mut chw = Vec::with_capacity(3 * side * side);
        for c in 0..3 {
            for pixel in resized.pixels() {
                chw.push(pixel[c] as f32 / 255.0);
            }
        }

        tensor(vec![1, 3, side, side], chw)
    }

    fn run_inference(&self, input: ort::value::Value) -> VisionResult<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::internal("Session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| VisionError::detection_failed(format!("ONNX inference failed: {e}")))?;

        let (_, data) = extract(outputs.get(OUTPUT_NAME), OUTPUT_NAME)?;
        Ok(data)
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, image: &RgbImage, min_confidence: f32) -> VisionResult<Vec<ObjectDetection>> {
        let input = self.preprocess(image)?;
        let output = self.run_inference(input)?;
        let detections = decode_output(&output, min_confidence)?;
        debug!(count = detections.len(), "Object detection completed");
        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "yolov8"
    }
}

/// Decode a `[1, 84, 8400]` YOLOv8 output into normalized detections.
///
/// Keeps the best class per candidate when its score reaches
/// `min_confidence`, applies per-class NMS and returns the survivors in
/// descending confidence order.
pub fn decode_output(output: &[f32], min_confidence: f32) -> VisionResult<Vec<ObjectDetection>> {
    if output.len() != NUM_FEATURES * NUM_BOXES {
        return Err(VisionError::detection_failed(format!(
            "Unexpected output size: expected {}, got {}",
            NUM_FEATURES * NUM_BOXES,
            output.len()
        )));
    }

    let output = Array::from_shape_vec((NUM_FEATURES, NUM_BOXES), output.to_vec())
        .map_err(|e| VisionError::internal(format!("Failed to reshape output: {e}")))?;
    let rows = output.t();
    let scale = INPUT_SIZE as f32;

    let mut candidates = Vec::new();
    for i in 0..NUM_BOXES {
        let (best_class, best_score) = (0..COCO_CLASSES.len())
            .map(|c| (c, rows[[i, 4 + c]]))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if best_score < min_confidence {
            continue;
        }

        let (cx, cy, w, h) = (rows[[i, 0]], rows[[i, 1]], rows[[i, 2]], rows[[i, 3]]);
        let x = ((cx - w / 2.0) / scale).clamp(0.0, 1.0);
        let y = ((cy - h / 2.0) / scale).clamp(0.0, 1.0);
        let bbox = BoundingBox::new(x, y, (w / scale).min(1.0 - x), (h / scale).min(1.0 - y));

        candidates.push((best_class, ObjectDetection {
            label: COCO_CLASSES[best_class].to_string(),
            confidence: best_score,
            bbox,
        }));
    }

    let kept = suppress_overlaps(
        candidates,
        |(_, d)| d.confidence,
        |(ca, a), (cb, b)| ca == cb && a.bbox.iou(&b.bbox) > NMS_THRESHOLD,
    );
    Ok(kept.into_iter().map(|(_, d)| d).collect())
}
