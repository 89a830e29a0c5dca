use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::RoutingHint;

/// POST /v1/ask body; the reply is the engine's `AgentResponse` as-is
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub routing_hint: Option<RoutingHint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub passages: usize,
    pub previous_passages: usize,
    pub duration_ms: u64,
    pub reloaded_at: DateTime<Utc>,
}
