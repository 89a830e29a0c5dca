//! Domain layer - Core types, traits and invariants of the question answering engine

pub mod agent;
pub mod corpus;
pub mod embedding;
pub mod engine_config;
pub mod error;
pub mod evidence;
pub mod llm;
pub mod orchestration;
pub mod query;
pub mod response;
pub mod verdict;
pub mod web_search;

pub use agent::{Agent, AgentError, AgentOutcome, AgentRequest, AgentResult, AgentRole};
pub use corpus::{Corpus, CorpusBuilder, CorpusHandle, CorpusIndex, DocumentStore, Passage, ScoredCandidate};
pub use embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use engine_config::{
    EngineConfig, EvaluationConfig, EvaluationStrategy, GenerationConfig, RetrievalConfig,
    ScoringConfig,
};
pub use error::{with_timeout, DomainError};
pub use evidence::{EvidenceItem, EvidenceScores, EvidenceSet, Provenance, SourceId};
pub use llm::{FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole, Usage};
pub use orchestration::{CancellationToken, DropGuard, FailureKind, OrchestrationState, Phase};
pub use query::{Query, RequestId, RequestIdGenerator, RoutingHint};
pub use response::{AgentResponse, Citation, Degradation, ResponseStatus};
pub use verdict::{Sufficiency, SufficiencyVerdict};
pub use web_search::{WebResult, WebSearchProvider};
