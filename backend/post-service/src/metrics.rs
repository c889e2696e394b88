//! Prometheus metrics for post-service.
//!
//! Exposes aggregate/auth/view counters and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Post aggregate operations by operation (create/update/delete/get/list) and outcome
    pub static ref POST_AGGREGATE_OPS: IntCounterVec = register_int_counter_vec!(
        "post_aggregate_ops_total",
        "Post aggregate operations by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("Prometheus metrics registration should succeed at startup");

    /// View events by outcome (recorded/error)
    pub static ref POST_VIEWS_RECORDED: IntCounterVec = register_int_counter_vec!(
        "post_views_recorded_total",
        "View events appended after post reads",
        &["outcome"]
    )
    .expect("Prometheus metrics registration should succeed at startup");

    /// Registration/login attempts by outcome
    pub static ref AUTH_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "auth_attempts_total",
        "Registration and login attempts by outcome",
        &["operation", "outcome"]
    )
    .expect("Prometheus metrics registration should succeed at startup");
}

/// Label value for a finished operation
pub fn outcome<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("metrics encoding failed: {}", err);
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
