//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use super::config::MetricsConfig;

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

const MAX_PATH_LABEL_LEN: usize = 50;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("regulation_rag_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!(path = %config.path, "Prometheus metrics initialized");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record the end of one query run
pub fn record_query_outcome(status: &str, hedged: bool, rounds: u32, duration: Duration) {
    let labels = [
        ("status", status.to_string()),
        ("hedged", hedged.to_string()),
    ];

    counter!("rag_queries_total", &labels).increment(1);
    histogram!("rag_query_duration_seconds", &labels).record(duration.as_secs_f64());
    histogram!("rag_query_rounds").record(f64::from(rounds));
}

/// Record a switch from local evidence to web search
pub fn record_escalation(round: u32) {
    counter!("rag_escalations_total", "round" => round.to_string()).increment(1);
}

/// Record a non-fatal degradation absorbed during a run
pub fn record_degradation(kind: &'static str) {
    counter!("rag_degradations_total", "kind" => kind).increment(1);
}

/// Record how many evidence items a retrieval round produced
pub fn record_retrieval(provenance: &'static str, items: usize) {
    histogram!("rag_retrieved_items", "provenance" => provenance).record(items as f64);
}

/// Record one language model call
pub fn record_llm_call(params: LlmCallMetricParams) {
    let labels = [
        ("purpose", params.purpose.to_string()),
        ("model", params.model.to_string()),
        ("status", if params.success { "success" } else { "error" }.to_string()),
    ];

    counter!("llm_requests_total", &labels).increment(1);
    histogram!("llm_request_duration_seconds", &labels).record(params.duration.as_secs_f64());

    if let Some(tokens) = params.input_tokens {
        counter!("llm_input_tokens_total", &labels).increment(tokens);
    }

    if let Some(tokens) = params.output_tokens {
        counter!("llm_output_tokens_total", &labels).increment(tokens);
    }
}

/// Parameters for language model call metrics
pub struct LlmCallMetricParams<'a> {
    /// `judgment` or `generation`
    pub purpose: &'static str,
    pub model: &'a str,
    pub duration: Duration,
    pub success: bool,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// Keep path label cardinality bounded
fn sanitize_path(path: &str) -> String {
    let path = NUMERIC_SEGMENT.replace_all(path, "/{id}$1");

    path.chars().take(MAX_PATH_LABEL_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_numeric_id() {
        assert_eq!(sanitize_path("/v1/queries/123/trace"), "/v1/queries/{id}/trace");
    }

    #[test]
    fn test_sanitize_path_no_id() {
        assert_eq!(sanitize_path("/v1/ask"), "/v1/ask");
    }

    #[test]
    fn test_sanitize_path_truncates_long_paths() {
        let path = "/very/long/path/that/exceeds/the/maximum/allowed/length/for/metrics";
        assert!(sanitize_path(path).len() <= MAX_PATH_LABEL_LEN);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_query_outcome("answered", false, 1, Duration::from_millis(20));
        record_escalation(2);
        record_degradation("provider_degraded");
        record_llm_call(LlmCallMetricParams {
            purpose: "generation",
            model: "m",
            duration: Duration::from_millis(5),
            success: true,
            input_tokens: Some(10),
            output_tokens: None,
        });
    }

    #[test]
    fn test_disabled_metrics_returns_none() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).is_none());
    }
}
