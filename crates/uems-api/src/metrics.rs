//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "uems_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "uems_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "uems_http_requests_in_flight";

    // Workflow metrics
    pub const REQUESTS_SUBMITTED_TOTAL: &str = "uems_requests_submitted_total";
    pub const REQUESTS_REVIEWED_TOTAL: &str = "uems_requests_reviewed_total";
    pub const REQUESTS_WITHDRAWN_TOTAL: &str = "uems_requests_withdrawn_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "uems_rate_limit_hits_total";
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

/// Record a submitted update request.
pub fn record_request_submitted() {
    counter!(names::REQUESTS_SUBMITTED_TOTAL).increment(1);
}

/// Record a decided update request.
pub fn record_request_reviewed(decision: &str) {
    let labels = [("decision", decision.to_string())];
    counter!(names::REQUESTS_REVIEWED_TOTAL, &labels).increment(1);
}

/// Record a withdrawn update request.
pub fn record_request_withdrawn() {
    counter!(names::REQUESTS_WITHDRAWN_TOTAL).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    // Request IDs are UUIDs, student and teacher IDs are numeric
    let path = regex_lite::Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .unwrap()
        .replace_all(path, ":request_id");
    let path = regex_lite::Regex::new(r"/[0-9]+(/|$)")
        .unwrap()
        .replace_all(&path, "/:id$1");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
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
        assert_eq!(
            sanitize_path("/api/students/42/requests"),
            "/api/students/:id/requests"
        );
        assert_eq!(
            sanitize_path("/api/requests/550e8400-e29b-41d4-a716-446655440000"),
            "/api/requests/:request_id"
        );
        assert_eq!(
            sanitize_path("/api/teachers/7/queue"),
            "/api/teachers/:id/queue"
        );
    }
}
