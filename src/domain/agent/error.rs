use thiserror::Error;

/// Failure taxonomy of the agents
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    /// Neither ranking could be produced; fatal for the run
    #[error("Retrieval unavailable: {message}")]
    RetrievalUnavailable { message: String },

    /// External provider failed; the run continues without it
    #[error("Provider degraded: {message}")]
    ProviderDegraded { message: String },

    /// Sufficiency judgment failed; treated as an ambiguous verdict
    #[error("Judgment unavailable: {message}")]
    JudgmentUnavailable { message: String },

    /// Answer could not be produced; fatal for the run
    #[error("Generation failed: {message}")]
    GenerationFailed { message: String },

    #[error("Cancelled")]
    Cancelled,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AgentError {
    pub fn retrieval_unavailable(message: impl Into<String>) -> Self {
        Self::RetrievalUnavailable {
            message: message.into(),
        }
    }

    pub fn provider_degraded(message: impl Into<String>) -> Self {
        Self::ProviderDegraded {
            message: message.into(),
        }
    }

    pub fn judgment_unavailable(message: impl Into<String>) -> Self {
        Self::JudgmentUnavailable {
            message: message.into(),
        }
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub(crate) fn unexpected(expected: &str, got: &str) -> Self {
        Self::internal(format!("expected {} outcome, got {}", expected, got))
    }

    /// Whether the run can continue after this error
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::ProviderDegraded { .. } | Self::JudgmentUnavailable { .. }
        )
    }
}
