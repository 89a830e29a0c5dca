//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Process is up
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    };

    (StatusCode::OK, Json(response))
}

/// Ready once a non-empty corpus is loaded
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let corpus = check_corpus(&state);
    let status = corpus.status;

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![corpus]),
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

fn check_corpus(state: &AppState) -> HealthCheck {
    let passages = state.corpus.passage_count();

    if passages == 0 {
        HealthCheck {
            name: "corpus".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some("Corpus is empty".to_string()),
        }
    } else {
        HealthCheck {
            name: "corpus".to_string(),
            status: HealthStatus::Healthy,
            message: Some(format!("{} passages", passages)),
        }
    }
}
