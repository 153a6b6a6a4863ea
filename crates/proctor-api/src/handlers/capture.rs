//! Frame capture and face validation handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Form;
use serde::Deserialize;
use tracing::warn;

use proctor_storage::StorageError;
use proctor_vision::Frame;

use super::{form, required};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::FRAME_HANDLE_HEADER;
use crate::state::AppState;

/// `/capture` form body.
#[derive(Debug, Deserialize)]
pub struct CaptureForm {
    pub image: Option<String>,
    pub username: Option<String>,
    /// `"true"` when the client detected background noise
    pub noise_violation: Option<String>,
    /// Handle of the enrollment frame
    pub reference_face: Option<String>,
}

/// `/validate-face` form body.
#[derive(Debug, Deserialize)]
pub struct ValidateFaceForm {
    pub image: Option<String>,
    pub reference_face: Option<String>,
}

/// Resolve the caller-supplied reference handle.
///
/// A handle that is missing or invalid still yields a frame, one without a
/// raster, so the identity stage answers "no match".
async fn resolve_reference(state: &AppState, handle: Option<String>) -> ApiResult<Option<Frame>> {
    let Some(handle) = handle.filter(|h| !h.trim().is_empty()) else {
        return Ok(None);
    };

    match state.frames.load(handle.trim()).await {
        Ok(frame) => Ok(Some(frame)),
        Err(e @ (StorageError::NotFound(_) | StorageError::InvalidHandle(_))) => {
            warn!(error = %e, "Reference face unavailable");
            Ok(Some(Frame::missing(handle)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Run a blocking detection protocol off the async runtime.
async fn run_blocking<T, F>(protocol: &'static str, f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("{protocol} task failed: {e}")))?;
    metrics::record_pipeline_duration(protocol, start.elapsed().as_secs_f64());
    Ok(result)
}

/// Evaluate one webcam frame for a user.
pub async fn capture(
    State(state): State<AppState>,
    body: Result<Form<CaptureForm>, FormRejection>,
) -> ApiResult<impl IntoResponse> {
    let body = form(body)?;
    let image = required(body.image, "image")?;
    let username = required(body.username, "username")?;
    let noisy = body
        .noise_violation
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

    let frame = state.frames.ingest(&image).await?;
    let reference = resolve_reference(&state, body.reference_face).await?;
    let handle = frame.handle().to_string();

    let pipeline = Arc::clone(&state.pipeline);
    let response = run_blocking("capture", move || {
        pipeline.capture(&username, &frame, reference.as_ref(), noisy)
    })
    .await?;

    Ok(([(FRAME_HANDLE_HEADER, handle)], response.to_string()))
}

/// Face presence check, plus identity when a reference is supplied.
pub async fn validate_face(
    State(state): State<AppState>,
    body: Result<Form<ValidateFaceForm>, FormRejection>,
) -> ApiResult<impl IntoResponse> {
    let body = form(body)?;
    let image = required(body.image, "image")?;

    let frame = state.frames.ingest(&image).await?;
    let reference = resolve_reference(&state, body.reference_face).await?;
    let handle = frame.handle().to_string();

    let pipeline = Arc::clone(&state.pipeline);
    let response = run_blocking("validate_face", move || {
        pipeline.validate_face(&frame, reference.as_ref())
    })
    .await?;

    Ok(([(FRAME_HANDLE_HEADER, handle)], response.to_string()))
}
