//! In-memory corpus combining a BM25 index and a vector index

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::bm25::Bm25Index;
use super::vector::VectorIndex;
use crate::domain::corpus::{CorpusIndex, DocumentStore, Passage, ScoredCandidate};
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::evidence::SourceId;
use crate::domain::DomainError;

const DEFAULT_EMBED_BATCH: usize = 64;

/// Immutable corpus snapshot; a rebuild produces a new value
#[derive(Debug)]
pub struct InMemoryCorpus {
    passages: Vec<Passage>,
    positions: HashMap<SourceId, usize>,
    keyword_index: Bm25Index,
    vector_index: VectorIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    model: String,
}

impl InMemoryCorpus {
    /// Embed every passage and build both indexes
    pub async fn build(
        passages: Vec<Passage>,
        embedder: Arc<dyn EmbeddingProvider>,
        model: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::build_with_batch_size(passages, embedder, model, DEFAULT_EMBED_BATCH).await
    }

    pub async fn build_with_batch_size(
        passages: Vec<Passage>,
        embedder: Arc<dyn EmbeddingProvider>,
        model: impl Into<String>,
        batch_size: usize,
    ) -> Result<Self, DomainError> {
        let model = model.into();
        let batch_size = batch_size.max(1);

        let mut positions = HashMap::with_capacity(passages.len());
        for (index, passage) in passages.iter().enumerate() {
            if positions.insert(passage.id.clone(), index).is_some() {
                return Err(DomainError::corpus(format!(
                    "Duplicate passage id '{}'",
                    passage.id
                )));
            }
        }

        let mut vectors = Vec::with_capacity(passages.len());
        for (batch_index, batch) in passages.chunks(batch_size).enumerate() {
            debug!(
                batch = batch_index,
                size = batch.len(),
                "Embedding corpus batch"
            );
            let request = EmbeddingRequest::new(
                model.clone(),
                batch.iter().map(|p| p.content.clone()).collect(),
            );
            let response = embedder.embed(request).await?;
            if response.embeddings().len() != batch.len() {
                return Err(DomainError::corpus(format!(
                    "Embedding provider returned {} vectors for {} passages",
                    response.embeddings().len(),
                    batch.len()
                )));
            }
            vectors.extend(response.into_vectors());
        }

        let keyword_index =
            Bm25Index::new(&passages.iter().map(|p| p.content.as_str()).collect::<Vec<_>>())?;
        let vector_index = VectorIndex::new(vectors);

        info!(
            passages = passages.len(),
            dimensions = vector_index.dimensions(),
            "Corpus index built"
        );

        Ok(Self {
            passages,
            positions,
            keyword_index,
            vector_index,
            embedder,
            model,
        })
    }

    fn candidates(&self, ranked: Vec<(usize, f64)>) -> Vec<ScoredCandidate> {
        ranked
            .into_iter()
            .map(|(index, score)| ScoredCandidate::new(self.passages[index].id.clone(), score))
            .collect()
    }
}

#[async_trait]
impl CorpusIndex for InMemoryCorpus {
    async fn semantic_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredCandidate>, DomainError> {
        if self.passages.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .embedder
            .embed(EmbeddingRequest::single(self.model.clone(), query))
            .await?;
        let embedding = response.first().ok_or_else(|| {
            DomainError::provider(self.embedder.provider_name(), "No embedding returned for query")
        })?;

        Ok(self.candidates(self.vector_index.search(embedding.vector(), k)))
    }

    async fn keyword_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredCandidate>, DomainError> {
        Ok(self.candidates(self.keyword_index.search(query, k)?))
    }
}

#[async_trait]
impl DocumentStore for InMemoryCorpus {
    async fn fetch(&self, id: &SourceId) -> Result<Passage, DomainError> {
        self.positions
            .get(id)
            .map(|&index| self.passages[index].clone())
            .ok_or_else(|| DomainError::not_found(format!("Passage '{}' not found", id)))
    }

    fn passage_count(&self) -> usize {
        self.passages.len()
    }
}
