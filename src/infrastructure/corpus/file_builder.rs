//! Builds the in-memory corpus from the scraped data file

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::in_memory::InMemoryCorpus;
use super::loader::load_passages;
use crate::domain::corpus::{Corpus, CorpusBuilder};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;

pub struct FileCorpusBuilder {
    path: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    model: String,
}

impl std::fmt::Debug for FileCorpusBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCorpusBuilder")
            .field("path", &self.path)
            .field("model", &self.model)
            .finish()
    }
}

impl FileCorpusBuilder {
    pub fn new(
        path: impl Into<PathBuf>,
        embedder: Arc<dyn EmbeddingProvider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            embedder,
            model: model.into(),
        }
    }
}

#[async_trait]
impl CorpusBuilder for FileCorpusBuilder {
    async fn build(&self) -> Result<Arc<dyn Corpus>, DomainError> {
        let passages = load_passages(&self.path).await?;
        let corpus =
            InMemoryCorpus::build(passages, Arc::clone(&self.embedder), self.model.clone()).await?;
        Ok(Arc::new(corpus))
    }
}
