//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    capture, fullscreen_violation, get_result, get_violations, health, list_results, ready,
    submit, tab_change_violation, validate_face, window_change_violation,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Token protocol consumed by the exam client
    let proctor_routes = Router::new()
        .route("/capture", post(capture))
        .route("/validate-face", post(validate_face))
        .route("/fullscreen-violation", post(fullscreen_violation))
        .route("/tab-change-violation", post(tab_change_violation))
        .route("/window-change-violation", post(window_change_violation))
        .route("/submit", post(submit));

    // Read-only views for operators
    let admin_routes = Router::new()
        .route("/results", get(list_results))
        .route("/results/:username", get(get_result))
        .route("/violations/:username", get(get_violations));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(proctor_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
