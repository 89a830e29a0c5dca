//! Web search provider trait
//!
//! Best-effort external lookup used when the local corpus does not answer a
//! question. Providers report their own relevance scale; callers normalize it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

#[cfg(test)]
use mockall::automock;

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub snippet: String,
    /// Provider relevance, any non-negative scale
    pub score: f64,
}

impl WebResult {
    pub fn new(url: impl Into<String>, snippet: impl Into<String>, score: f64) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            snippet: snippet.into(),
            score,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// External search provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Search the web, returning at most `max_results` hits
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebResult>, DomainError>;

    fn provider_name(&self) -> &'static str;
}
