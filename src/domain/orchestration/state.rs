use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentError;
use crate::domain::evidence::EvidenceSet;
use crate::domain::query::RequestId;
use crate::domain::response::Degradation;
use crate::domain::verdict::SufficiencyVerdict;

/// Why a run ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    LocalIndexUnavailable,
    GenerationFailed,
    Cancelled,
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalIndexUnavailable => "local_index_unavailable",
            Self::GenerationFailed => "generation_failed",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }

    /// Message shown to the end user; never includes internal details
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::LocalIndexUnavailable => {
                "The regulations knowledge base is currently unavailable. Please try again later."
            }
            Self::GenerationFailed => {
                "An answer could not be generated right now. Please try again later."
            }
            Self::Cancelled => "The request was cancelled.",
            Self::Internal => "An internal error occurred while processing the question.",
        }
    }

    pub fn from_error(error: &AgentError) -> Self {
        match error {
            AgentError::RetrievalUnavailable { .. } => Self::LocalIndexUnavailable,
            AgentError::GenerationFailed { .. } => Self::GenerationFailed,
            AgentError::Cancelled => Self::Cancelled,
            _ => Self::Internal,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrator phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Routing,
    Retrieving { round: u32 },
    Evaluating { round: u32 },
    Escalating { round: u32 },
    Generating { hedge: bool },
    Done,
    Failed(FailureKind),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Routing => write!(f, "routing"),
            Self::Retrieving { round } => write!(f, "retrieving({})", round),
            Self::Evaluating { round } => write!(f, "evaluating({})", round),
            Self::Escalating { round } => write!(f, "escalating({})", round),
            Self::Generating { hedge } => write!(f, "generating(hedge={})", hedge),
            Self::Done => write!(f, "done"),
            Self::Failed(kind) => write!(f, "failed({})", kind),
        }
    }
}

/// Per-run transient record, owned by one orchestrator run
#[derive(Debug)]
pub struct OrchestrationState {
    pub request_id: RequestId,
    phase: Phase,
    pub evidence: EvidenceSet,
    round: u32,
    pub last_verdict: Option<SufficiencyVerdict>,
    pub errors: Vec<AgentError>,
    pub degradations: Vec<Degradation>,
}

impl OrchestrationState {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            phase: Phase::Routing,
            evidence: EvidenceSet::empty(),
            round: 0,
            last_verdict: None,
            errors: Vec::new(),
            degradations: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of retrieval rounds started so far
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn transition(&mut self, next: Phase) {
        tracing::debug!(
            request_id = %self.request_id,
            from = %self.phase,
            to = %next,
            "Phase transition"
        );
        self.phase = next;
    }

    /// Enter the next retrieval round and return its number
    pub fn begin_round(&mut self) -> u32 {
        self.round += 1;
        self.transition(Phase::Retrieving { round: self.round });
        self.round
    }

    pub fn record_error(&mut self, error: AgentError) {
        self.errors.push(error);
    }

    pub fn record_degradations(&mut self, degradations: Vec<Degradation>) {
        self.degradations.extend(degradations);
    }

    /// Move to `Failed`, dropping any accumulated evidence
    pub fn fail(&mut self, kind: FailureKind) {
        self.evidence = EvidenceSet::empty();
        self.transition(Phase::Failed(kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_advance_the_phase() {
        let mut state = OrchestrationState::new(RequestId::new(1));
        assert_eq!(state.round(), 0);
        assert_eq!(state.phase(), Phase::Routing);

        assert_eq!(state.begin_round(), 1);
        assert_eq!(state.phase(), Phase::Retrieving { round: 1 });
        state.transition(Phase::Evaluating { round: 1 });
        assert_eq!(state.begin_round(), 2);
        assert_eq!(state.phase(), Phase::Retrieving { round: 2 });
    }

    #[test]
    fn test_errors_accumulate_across_the_run() {
        let mut state = OrchestrationState::new(RequestId::new(3));
        state.record_error(AgentError::internal("first"));
        state.record_error(AgentError::Cancelled);

        assert_eq!(state.errors.len(), 2);
        assert!(matches!(state.errors[1], AgentError::Cancelled));
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut state = OrchestrationState::new(RequestId::new(2));
        state.fail(FailureKind::LocalIndexUnavailable);

        assert!(state.phase().is_terminal());
        assert!(state.evidence.is_empty());
        assert_eq!(state.phase().to_string(), "failed(local_index_unavailable)");
    }

    #[test]
    fn test_failure_kind_from_error() {
        assert_eq!(
            FailureKind::from_error(&AgentError::retrieval_unavailable("x")),
            FailureKind::LocalIndexUnavailable
        );
        assert_eq!(
            FailureKind::from_error(&AgentError::Cancelled),
            FailureKind::Cancelled
        );
        assert_eq!(
            FailureKind::from_error(&AgentError::internal("x")),
            FailureKind::Internal
        );
    }
}
