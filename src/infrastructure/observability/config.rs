//! Observability configuration

use serde::Deserialize;

pub const DEFAULT_SERVICE_NAME: &str = "regulation-rag-agent";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub tracing: TracingConfig,
    pub metrics: MetricsConfig,
}

/// OpenTelemetry span export; off unless enabled
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub otlp_endpoint: String,
    pub service_name: String,
    /// Fraction of root spans kept, clamped to [0, 1]
    pub sampling_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Route serving the Prometheus exposition
    pub path: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            sampling_ratio: 1.0,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}
