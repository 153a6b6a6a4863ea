//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "proctor_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "proctor_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "proctor_http_requests_in_flight";

    // Proctoring metrics
    pub const VIOLATIONS_TOTAL: &str = "proctor_violations_total";
    pub const TERMINATIONS_TOTAL: &str = "proctor_terminations_total";
    pub const DECISIONS_TOTAL: &str = "proctor_decisions_total";
    pub const DETECTOR_UNAVAILABLE_TOTAL: &str = "proctor_detector_unavailable_total";
    pub const PIPELINE_DURATION_SECONDS: &str = "proctor_pipeline_duration_seconds";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "proctor_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a violation written to the ledger.
pub fn record_violation(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::VIOLATIONS_TOTAL, &labels).increment(1);
}

/// Record a user crossing the violation threshold.
pub fn record_termination(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::TERMINATIONS_TOTAL, &labels).increment(1);
}

/// Record the token a protocol call answered with.
pub fn record_decision(protocol: &str, decision: &str) {
    let labels = [
        ("protocol", protocol.to_string()),
        ("decision", decision.to_string()),
    ];
    counter!(names::DECISIONS_TOTAL, &labels).increment(1);
}

/// Record a check that failed open because its detector was unavailable.
pub fn record_detector_unavailable(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::DETECTOR_UNAVAILABLE_TOTAL, &labels).increment(1);
}

/// Record the time spent in a blocking detection protocol.
pub fn record_pipeline_duration(protocol: &str, duration_secs: f64) {
    let labels = [("protocol", protocol.to_string())];
    histogram!(names::PIPELINE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (drop usernames).
fn sanitize_path(path: &str) -> String {
    for prefix in ["/results/", "/violations/"] {
        if path.starts_with(prefix) && path.len() > prefix.len() {
            return format!("{prefix}:username");
        }
    }
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/results/alice"), "/results/:username");
        assert_eq!(sanitize_path("/violations/bob"), "/violations/:username");
        assert_eq!(sanitize_path("/results"), "/results");
        assert_eq!(sanitize_path("/capture"), "/capture");
    }
}
