//! Prometheus metrics endpoint
//!
//! Exposes relay metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use tracing::warn;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    if metrics::set_global_recorder(recorder).is_err() {
        warn!("A metrics recorder was already installed; /metrics may be empty");
    }
    handle
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    let _ = &*PROMETHEUS_HANDLE;

    metrics::describe_counter!("relay_requests_total", "Total number of relayed requests");
    metrics::describe_histogram!(
        "relay_request_duration_seconds",
        "Time from request receipt to response completion"
    );
    metrics::describe_counter!(
        "relay_tokens_processed_total",
        "Tokens reported by upstream usage events"
    );
    metrics::describe_counter!(
        "relay_stream_parse_errors_total",
        "Upstream stream lines that could not be parsed"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a completed request
pub fn record_request(status: &str, model: &str, duration_secs: f64) {
    metrics::counter!(
        "relay_requests_total",
        "status" => status.to_string(),
        "model" => model.to_string()
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "model" => model.to_string())
        .record(duration_secs);
}

/// Record tokens processed
pub fn record_tokens(token_type: &str, count: u64, model: &str) {
    metrics::counter!(
        "relay_tokens_processed_total",
        "type" => token_type.to_string(),
        "model" => model.to_string()
    )
    .increment(count);
}

/// Record an upstream line dropped or forwarded unparsed
pub fn record_stream_parse_error(mode: &'static str) {
    metrics::counter!("relay_stream_parse_errors_total", "mode" => mode).increment(1);
}
