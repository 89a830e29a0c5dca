use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::Passage;
use crate::domain::evidence::SourceId;
use crate::domain::DomainError;

/// One entry of a ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: SourceId,
    pub score: f64,
}

impl ScoredCandidate {
    pub fn new(id: SourceId, score: f64) -> Self {
        Self { id, score }
    }
}

/// Two independent rankings over the corpus
///
/// Both return an empty list for an empty corpus; errors mean the ranking
/// could not be produced at all.
#[async_trait]
pub trait CorpusIndex: Send + Sync + Debug {
    async fn semantic_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredCandidate>, DomainError>;

    async fn keyword_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredCandidate>, DomainError>;
}

/// Passage lookup by candidate id
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    async fn fetch(&self, id: &SourceId) -> Result<Passage, DomainError>;

    fn passage_count(&self) -> usize;
}

/// A complete corpus snapshot
pub trait Corpus: CorpusIndex + DocumentStore {}

impl<T: CorpusIndex + DocumentStore> Corpus for T {}
