//! Exam results and ledger inspection handlers.

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use proctor_models::{ExamResult, LedgerState, ProctorResponse};

use super::{form, required};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `/submit` form body.
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    pub username: Option<String>,
    pub score: Option<String>,
}

/// Ledger view for one user.
#[derive(Debug, Serialize, Deserialize)]
pub struct ViolationSummary {
    pub username: String,
    pub count: u64,
    pub state: LedgerState,
}

/// Store an exam score. Non-numeric scores are stored as 0.
pub async fn submit(
    State(state): State<AppState>,
    body: Result<Form<SubmitForm>, FormRejection>,
) -> ApiResult<String> {
    let body = form(body)?;
    let username = required(body.username, "username")?;
    let score = ExamResult::parse_score(body.score.as_deref().unwrap_or_default());

    state.results.submit(ExamResult::new(username, score));
    Ok(ProctorResponse::Ok.to_string())
}

/// All results in submission order.
pub async fn list_results(State(state): State<AppState>) -> Json<Vec<ExamResult>> {
    Json(state.results.all())
}

/// First result submitted by a user.
pub async fn get_result(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<ExamResult>> {
    state
        .results
        .first_for(&username)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no result for {username}")))
}

/// Current violation count and state for a user.
pub async fn get_violations(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Json<ViolationSummary> {
    Json(ViolationSummary {
        count: state.ledger.count(&username),
        state: state.ledger.state(&username),
        username,
    })
}
