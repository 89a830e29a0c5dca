//! Evidence item and source identity

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a piece of evidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Local regulations corpus
    Local,
    /// External web search
    Web,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document (or URL) plus chunk offset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId {
    pub document: String,
    pub chunk: u32,
}

impl SourceId {
    pub fn new(document: impl Into<String>, chunk: u32) -> Self {
        Self {
            document: document.into(),
            chunk,
        }
    }

    /// Web results are addressed by URL only
    pub fn url(url: impl Into<String>) -> Self {
        Self::new(url, 0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.chunk)
    }
}

/// A retrieved unit of text considered as potential support for an answer
///
/// Immutable once built; the scorer is the only producer of combined scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    source: SourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    content: String,
    semantic_score: f64,
    keyword_score: f64,
    combined_score: f64,
    provenance: Provenance,
}

impl EvidenceItem {
    pub fn new(
        source: SourceId,
        content: impl Into<String>,
        provenance: Provenance,
        scores: EvidenceScores,
    ) -> Self {
        Self {
            source,
            title: None,
            content: content.into(),
            semantic_score: scores.semantic,
            keyword_score: scores.keyword,
            combined_score: scores.combined,
            provenance,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Raw semantic score as returned by the ranking
    pub fn semantic_score(&self) -> f64 {
        self.semantic_score
    }

    /// Raw keyword score as returned by the ranking
    pub fn keyword_score(&self) -> f64 {
        self.keyword_score
    }

    pub fn combined_score(&self) -> f64 {
        self.combined_score
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }
}

/// Raw and combined scores attached to an evidence item
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvidenceScores {
    pub semantic: f64,
    pub keyword: f64,
    pub combined: f64,
}

impl EvidenceScores {
    pub fn new(semantic: f64, keyword: f64, combined: f64) -> Self {
        Self {
            semantic,
            keyword,
            combined,
        }
    }
}
