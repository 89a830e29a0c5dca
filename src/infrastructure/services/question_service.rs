//! Question service - turns raw questions into orchestrated runs

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    AgentResponse, CancellationToken, DomainError, Query, RequestIdGenerator, RoutingHint,
};
use crate::infrastructure::orchestrator::Orchestrator;

const MAX_QUESTION_CHARS: usize = 2_000;

pub struct QuestionService {
    orchestrator: Arc<Orchestrator>,
    ids: RequestIdGenerator,
}

impl std::fmt::Debug for QuestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionService")
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl QuestionService {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            ids: RequestIdGenerator::new(),
        }
    }

    /// Validate the question and run it to completion
    ///
    /// Only malformed input is an error; every run outcome, failures
    /// included, comes back as an [`AgentResponse`].
    pub async fn ask(
        &self,
        question: &str,
        routing_hint: Option<RoutingHint>,
        cancel: &CancellationToken,
    ) -> Result<AgentResponse, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("Question must not be empty"));
        }
        if question.chars().count() > MAX_QUESTION_CHARS {
            return Err(DomainError::validation(format!(
                "Question exceeds {} characters",
                MAX_QUESTION_CHARS
            )));
        }

        let mut query = Query::new(self.ids.next_id(), question);
        if let Some(hint) = routing_hint {
            query = query.with_routing_hint(hint);
        }

        info!(request_id = %query.id(), chars = question.chars().count(), "Question received");

        Ok(self.orchestrator.run(&query, cancel).await)
    }
}
