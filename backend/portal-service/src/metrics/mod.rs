//! Prometheus metrics for portal-service.
//!
//! Exposes interaction counters, the HTTP request histogram, and the handler
//! for the `/metrics` endpoint.

use crate::error::AppError;
use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Like toggles by target kind (post/comment) and outcome (liked/unliked).
    pub static ref LIKE_TOGGLES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "portal_like_toggles_total",
        "Like toggles segmented by target kind and resulting state",
        &["target", "result"]
    )
    .expect("failed to register portal_like_toggles_total");

    /// Failed interaction operations by operation and error kind.
    pub static ref INTERACTION_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "portal_interaction_errors_total",
        "Failed interaction operations segmented by operation and error kind",
        &["operation", "kind"]
    )
    .expect("failed to register portal_interaction_errors_total");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "portal_http_request_duration_seconds",
        "HTTP request duration segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register portal_http_request_duration_seconds");
}

pub fn record_like_toggle(target: &str, liked: bool) {
    let result = if liked { "liked" } else { "unliked" };
    LIKE_TOGGLES_TOTAL.with_label_values(&[target, result]).inc();
}

pub fn record_error(operation: &str, err: &AppError) {
    INTERACTION_ERRORS_TOTAL
        .with_label_values(&[operation, err.kind()])
        .inc();
}

pub fn observe_request(method: &str, status: u16, elapsed_secs: f64) {
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, &status.to_string()])
        .observe(elapsed_secs);
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
