//! Prometheus metrics
//!
//! The recorder is installed once at startup; the agent crate records turn,
//! action and LLM metrics through the same global recorder.

use std::sync::OnceLock;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Later calls return the first handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_default_metrics();
    Ok(METRICS_HANDLE.get_or_init(|| handle).clone())
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

fn register_default_metrics() {
    for endpoint in ["health", "chat", "reset", "ocr", "stt", "tts"] {
        counter!("utility_agent_requests_total", "endpoint" => endpoint).absolute(0);
    }
    for path in ["deterministic", "model"] {
        counter!("utility_agent_turns_total", "path" => path).absolute(0);
    }
    for kind in ["store", "llm", "tool", "integration", "internal"] {
        counter!("utility_agent_errors_total", "type" => kind).absolute(0);
    }
    histogram!("utility_agent_turn_duration_seconds").record(0.0);
    histogram!("utility_agent_llm_duration_seconds").record(0.0);
}

pub fn record_request(endpoint: &'static str) {
    counter!("utility_agent_requests_total", "endpoint" => endpoint).increment(1);
}

pub fn record_error(error_type: &'static str) {
    counter!("utility_agent_errors_total", "type" => error_type).increment(1);
}

pub fn record_collaborator_latency(collaborator: &'static str, duration_secs: f64) {
    histogram!("utility_agent_collaborator_duration_seconds", "collaborator" => collaborator)
        .record(duration_secs);
}

/// `GET /metrics`
pub async fn metrics_handler() -> impl IntoResponse {
    match get_metrics_handle() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}
