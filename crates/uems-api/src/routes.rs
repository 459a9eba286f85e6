//! API routes.

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::admin::{
    admin_review, create_student, create_teacher, get_request_detail, list_all_requests,
    list_students, list_teachers, remove_request,
};
use crate::handlers::health::{health, ready};
use crate::handlers::students::{
    amend_request, get_profile_detail, list_student_requests, submit_request, withdraw_request,
};
use crate::handlers::teachers::{approve_request, reject_request, review_queue};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let student_routes = Router::new()
        .route(
            "/students/:student_id/profile-requests",
            post(submit_request).get(list_student_requests),
        )
        .route(
            "/students/:student_id/profile-requests/:request_id",
            put(amend_request).delete(withdraw_request),
        )
        .route("/students/:student_id/profile", get(get_profile_detail));

    let teacher_routes = Router::new()
        .route("/teachers/:teacher_id/profile-requests", get(review_queue))
        .route(
            "/teachers/:teacher_id/profile-requests/:request_id/approve",
            put(approve_request),
        )
        .route(
            "/teachers/:teacher_id/profile-requests/:request_id/reject",
            put(reject_request),
        );

    let admin_routes = Router::new()
        .route("/admin/profile-requests", get(list_all_requests))
        .route(
            "/admin/profile-requests/:request_id",
            get(get_request_detail).delete(remove_request),
        )
        .route("/admin/profile-requests/:request_id/review", put(admin_review))
        .route("/admin/students", post(create_student).get(list_students))
        .route("/admin/teachers", post(create_teacher).get(list_teachers));

    let mut api_routes = Router::new()
        .merge(student_routes)
        .merge(teacher_routes)
        .merge(admin_routes);

    // Rate limiting on the API surface only, disabled when the quota is zero
    if state.config.rate_limit_per_minute > 0 {
        let rate_limiter =
            std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_per_minute));
        api_routes = api_routes.layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));
    }

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_bytes))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
