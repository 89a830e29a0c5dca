//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Turns text into dense vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    fn provider_name(&self) -> &'static str;

    fn default_model(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::embedding::{Embedding, EmbeddingUsage};

    /// Bag-of-words hashing embedder: texts sharing words get similar vectors
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        name: &'static str,
        dimensions: usize,
        error: Option<String>,
    }

    impl MockEmbeddingProvider {
        pub fn new(name: &'static str, dimensions: usize) -> Self {
            Self {
                name,
                dimensions,
                error: None,
            }
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        fn vectorize(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0; self.dimensions];
            for word in text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
            {
                let hash = word
                    .to_lowercase()
                    .bytes()
                    .fold(5381u64, |acc, b| acc.wrapping_mul(33).wrapping_add(b as u64));
                vector[(hash % self.dimensions as u64) as usize] += 1.0;
            }
            vector
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.name, error));
            }

            let embeddings = request
                .inputs()
                .iter()
                .enumerate()
                .map(|(idx, text)| Embedding::new(idx, self.vectorize(text)))
                .collect();

            let tokens = request.inputs().iter().map(|t| t.len() / 4).sum::<usize>() as u32;

            Ok(EmbeddingResponse::new(
                request.model(),
                embeddings,
                EmbeddingUsage::new(tokens, tokens),
            ))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }

        fn default_model(&self) -> &str {
            "mock-embedding"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::embedding::cosine_similarity;

        #[tokio::test]
        async fn test_mock_provider_batch() {
            let provider = MockEmbeddingProvider::new("test", 64);
            let request = EmbeddingRequest::new("mock", vec!["brand".into(), "loft".into()]);

            let response = provider.embed(request).await.unwrap();

            assert_eq!(response.embeddings().len(), 2);
            assert_eq!(response.embeddings()[0].dimensions(), 64);
        }

        #[tokio::test]
        async fn test_shared_words_are_similar() {
            let provider = MockEmbeddingProvider::new("test", 256);
            let request = EmbeddingRequest::new(
                "mock",
                vec![
                    "minimum ceiling height".into(),
                    "ceiling height for rooms".into(),
                    "fire doors".into(),
                ],
            );

            let vectors = provider.embed(request).await.unwrap().into_vectors();

            let related = cosine_similarity(&vectors[0], &vectors[1]);
            let unrelated = cosine_similarity(&vectors[0], &vectors[2]);
            assert!(related > unrelated);
        }

        #[tokio::test]
        async fn test_mock_provider_error() {
            let provider = MockEmbeddingProvider::new("test", 8).with_error("API error");
            let result = provider.embed(EmbeddingRequest::single("mock", "x")).await;

            assert!(result.is_err());
        }
    }
}
