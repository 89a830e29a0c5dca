//! Question endpoint

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, AskRequest, Json};
use crate::domain::{CancellationToken, ResponseStatus};

/// POST /v1/ask
///
/// The run executes on its own task. If the client goes away the handler
/// future is dropped, the token is cancelled and the run stops at its next
/// phase boundary. Engine failures still produce an `AgentResponse` body;
/// only the status code changes.
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let questions = Arc::clone(&state.questions);
    let run = tokio::spawn(async move {
        questions
            .ask(&request.question, request.routing_hint, &cancel)
            .await
    });

    let response = run
        .await
        .map_err(|e| ApiError::internal(format!("Question task failed: {}", e)))?
        .map_err(|e| ApiError::from(e).with_param("question"))?;
    guard.disarm();

    info!(
        request_id = ?response.request_id,
        status = response.status.as_str(),
        hedged = response.hedged,
        rounds = response.rounds,
        citations = response.citations.len(),
        "Question answered"
    );

    let status = match response.status {
        ResponseStatus::Answered | ResponseStatus::InsufficientEvidence => StatusCode::OK,
        ResponseStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
    };

    Ok((status, Json(response)))
}
