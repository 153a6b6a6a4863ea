//! ONNX Runtime session construction with execution provider selection.

use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};

/// Load a model into a session, preferring CUDA when the `cuda` feature is on.
///
/// `purpose` only labels the log lines.
pub fn create_session(model_path: &Path, purpose: &str) -> VisionResult<Session> {
    if !model_path.exists() {
        return Err(VisionError::model_not_found(model_path.display().to_string()));
    }

    let model_bytes = std::fs::read(model_path)?;

    let builder = Session::builder()
        .map_err(|e| VisionError::internal(format!("Failed to create session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| VisionError::internal(format!("Failed to set optimization level: {e}")))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!(purpose, "Using CUDA execution provider");
                return Ok(session);
            }
        }
        debug!(purpose, "CUDA execution provider not available, using CPU");
    }

    debug!(purpose, path = %model_path.display(), bytes = model_bytes.len(), "Loading model");
    let session = builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| VisionError::internal(format!("Failed to load ONNX model: {e}")))?;
    info!(purpose, path = %model_path.display(), "Model loaded on CPU");
    Ok(session)
}

/// Build an f32 input tensor from a flat buffer.
pub fn tensor(shape: Vec<usize>, data: Vec<f32>) -> VisionResult<Value> {
    Tensor::from_array((shape, data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| VisionError::internal(format!("Failed to create tensor: {e}")))
}

/// Copy out an f32 output as (shape, data).
///
/// `value` is the result of looking `name` up in the session outputs.
pub fn extract(value: Option<&Value>, name: &str) -> VisionResult<(Vec<i64>, Vec<f32>)> {
    let value =
        value.ok_or_else(|| VisionError::detection_failed(format!("Missing output tensor {name}")))?;
    let (shape, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| VisionError::detection_failed(format!("Failed to extract {name}: {e}")))?;
    Ok((shape.iter().copied().collect(), data.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_reported() {
        let err = create_session(Path::new("/nonexistent/model.onnx"), "test").unwrap_err();
        assert!(matches!(err, VisionError::ModelNotFound(_)));
    }
}
