//! Observability infrastructure - Tracing and Metrics

mod config;
mod metrics;
mod tracing_setup;

pub use config::{MetricsConfig, ObservabilityConfig, TracingConfig, DEFAULT_SERVICE_NAME};
pub use metrics::{
    create_metrics_router, init_metrics, record_degradation, record_escalation,
    record_http_request, record_llm_call, record_query_outcome, record_retrieval,
    LlmCallMetricParams, PrometheusMetrics,
};
pub use tracing_setup::{init_tracing, shutdown_tracing};
