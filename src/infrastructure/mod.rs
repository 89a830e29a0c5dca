//! Infrastructure layer - Agents, orchestration and external service implementations

pub mod agents;
pub mod corpus;
pub mod embedding;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod orchestrator;
pub mod scoring;
pub mod services;
pub mod web_search;

pub use orchestrator::Orchestrator;
pub use services::{CorpusService, QuestionService};
