//! Embedding request types

use serde::{Deserialize, Serialize};

/// Request to embed one or more texts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input,
            dimensions: None,
        }
    }

    /// Request for a single text (query embedding)
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(model, vec![text.into()])
    }

    /// Output dimensions, for models that support shortening
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn inputs(&self) -> &[String] {
        &self.input
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}
