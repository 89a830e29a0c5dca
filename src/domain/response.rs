//! Final response returned to the presentation layer

use serde::{Deserialize, Serialize};

use super::evidence::{EvidenceItem, Provenance, SourceId};
use super::query::RequestId;

const EXCERPT_MAX_CHARS: usize = 200;

/// Terminal status of one query run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Answered,
    InsufficientEvidence,
    Error,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::InsufficientEvidence => "insufficient_evidence",
            Self::Error => "error",
        }
    }
}

/// Reference to an evidence item the answer relies on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based marker as it appears in the answer text (`[n]`)
    pub marker: usize,
    pub source: SourceId,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub excerpt: String,
    pub score: f64,
}

impl Citation {
    pub fn from_item(marker: usize, item: &EvidenceItem) -> Self {
        Self {
            marker,
            source: item.source().clone(),
            provenance: item.provenance(),
            title: item.title().map(str::to_string),
            excerpt: excerpt(item.content(), EXCERPT_MAX_CHARS),
            score: item.combined_score(),
        }
    }
}

/// Non-fatal problem encountered during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Web search failed or timed out; the run continued without it
    ProviderDegraded { message: String },
    /// Sufficiency judgment failed; mapped to an ambiguous verdict
    JudgmentUnavailable { message: String },
}

impl Degradation {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::ProviderDegraded {
            message: message.into(),
        }
    }

    pub fn judgment(message: impl Into<String>) -> Self {
        Self::JudgmentUnavailable {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProviderDegraded { .. } => "provider_degraded",
            Self::JudgmentUnavailable { .. } => "judgment_unavailable",
        }
    }
}

/// Answer text, citations and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    pub status: ResponseStatus,
    pub answer: String,
    pub citations: Vec<Citation>,
    /// Answer explicitly acknowledges uncertain evidence
    #[serde(default)]
    pub hedged: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<Degradation>,
    #[serde(default)]
    pub rounds: u32,
}

impl AgentResponse {
    fn new(status: ResponseStatus, answer: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            request_id: None,
            status,
            answer: answer.into(),
            citations,
            hedged: false,
            degradations: Vec::new(),
            rounds: 0,
        }
    }

    pub fn answered(answer: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self::new(ResponseStatus::Answered, answer, citations)
    }

    pub fn insufficient_evidence(message: impl Into<String>) -> Self {
        Self::new(ResponseStatus::InsufficientEvidence, message, Vec::new())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ResponseStatus::Error, message, Vec::new())
    }

    pub fn hedged(mut self) -> Self {
        self.hedged = true;
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_degradations(mut self, degradations: Vec<Degradation>) -> Self {
        self.degradations = degradations;
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn is_answered(&self) -> bool {
        self.status == ResponseStatus::Answered
    }

    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }
}

/// Cut `text` to at most `max_chars`, preferring the last sentence end in range
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    let sentence_end = cut
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, _)| i)
        .last();

    match sentence_end {
        Some(end) if end > max_chars / 3 => cut[..=end].to_string(),
        _ => format!("{}...", cut.trim_end()),
    }
}
