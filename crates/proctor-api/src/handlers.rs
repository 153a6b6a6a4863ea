//! Request handlers.

pub mod capture;
pub mod events;
pub mod health;
pub mod results;

pub use capture::*;
pub use events::*;
pub use health::*;
pub use results::*;

use axum::extract::rejection::FormRejection;
use axum::Form;

use crate::error::{ApiError, ApiResult};

/// Unwrap a form body, mapping rejections to `ERROR`.
pub(crate) fn form<T>(form: Result<Form<T>, FormRejection>) -> ApiResult<T> {
    form.map(|Form(inner)| inner)
        .map_err(|e| ApiError::bad_request(format!("invalid form body: {e}")))
}

/// A required, non-empty form field.
pub(crate) fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing field: {field}")))
}
