//! Browser event handlers (fullscreen exit, tab change, window change).

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::Form;
use serde::Deserialize;

use proctor_models::ViolationKind;

use super::{form, required};
use crate::error::ApiResult;
use crate::state::AppState;

/// Event form body.
#[derive(Debug, Deserialize)]
pub struct EventForm {
    pub username: Option<String>,
}

fn report(state: &AppState, body: Result<Form<EventForm>, FormRejection>, kind: ViolationKind) -> ApiResult<String> {
    let username = required(form(body)?.username, "username")?;
    Ok(state.pipeline.report_event(&username, kind).to_string())
}

pub async fn fullscreen_violation(
    State(state): State<AppState>,
    body: Result<Form<EventForm>, FormRejection>,
) -> ApiResult<String> {
    report(&state, body, ViolationKind::FullscreenExit)
}

pub async fn tab_change_violation(
    State(state): State<AppState>,
    body: Result<Form<EventForm>, FormRejection>,
) -> ApiResult<String> {
    report(&state, body, ViolationKind::TabChange)
}

pub async fn window_change_violation(
    State(state): State<AppState>,
    body: Result<Form<EventForm>, FormRejection>,
) -> ApiResult<String> {
    report(&state, body, ViolationKind::WindowChange)
}
