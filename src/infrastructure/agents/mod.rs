//! The four engine agents
//!
//! Each one implements [`crate::domain::Agent`] and is dispatched by the
//! orchestrator according to the current phase.

mod context_evaluator;
mod generator;
mod knowledge_retriever;
mod prompts;
mod web_search;

pub use context_evaluator::ContextEvaluatorAgent;
pub use generator::{cite, GeneratorAgent};
pub use knowledge_retriever::KnowledgeRetrieverAgent;
pub use prompts::{HEDGE_NOTICE, NO_CONTEXT_ANSWER, REFUSAL_ANSWER};
pub use web_search::WebSearchAgent;
