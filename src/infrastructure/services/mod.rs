//! Application services used by the CLI and HTTP surfaces

mod corpus_service;
mod question_service;

pub use corpus_service::{CorpusService, ReloadOutcome};
pub use question_service::QuestionService;

#[cfg(test)]
pub use corpus_service::mock::{corpus_of, MockCorpusBuilder};
