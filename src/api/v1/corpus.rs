//! Corpus administration

use axum::extract::State;
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ReloadResponse};

/// POST /v1/corpus/reload
pub async fn reload_corpus(State(state): State<AppState>) -> Result<Json<ReloadResponse>, ApiError> {
    let outcome = state.corpus.reload().await.map_err(|e| {
        warn!(error = %e, "Corpus reload failed, keeping the current corpus");
        ApiError::from(e)
    })?;

    Ok(Json(ReloadResponse {
        passages: outcome.passages,
        previous_passages: outcome.previous_passages,
        duration_ms: outcome.duration.as_millis() as u64,
        reloaded_at: outcome.reloaded_at,
    }))
}
