//! Engine tuning knobs
//!
//! Weights, thresholds, timeouts and round limits are fixed when the engine is
//! built and never change during a run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Hybrid score fusion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub semantic_weight: f64,
    pub keyword_weight: f64,
    /// Maximum size of any evidence set handed downstream
    pub top_k: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.6,
            keyword_weight: 0.4,
            top_k: 8,
        }
    }
}

/// Local and web retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidates requested from each ranking
    pub candidate_k: usize,
    pub index_timeout_ms: u64,
    pub web_timeout_ms: u64,
    pub web_max_results: usize,
    /// Terms that mark a query as already carrying regulatory context
    pub web_context_terms: Vec<String>,
    /// Appended to web queries lacking any context term
    pub web_query_suffix: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_k: 20,
            index_timeout_ms: 5_000,
            web_timeout_ms: 10_000,
            web_max_results: 5,
            web_context_terms: vec![
                "bygningsreglement".to_string(),
                "br18".to_string(),
                "br15".to_string(),
            ],
            web_query_suffix: "bygningsreglement Danmark".to_string(),
        }
    }
}

impl RetrievalConfig {
    pub fn index_timeout(&self) -> Duration {
        Duration::from_millis(self.index_timeout_ms)
    }

    pub fn web_timeout(&self) -> Duration {
        Duration::from_millis(self.web_timeout_ms)
    }
}

/// How sufficiency is judged once the count and floor gates pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStrategy {
    /// Ask the language model
    #[default]
    Llm,
    /// Query-term coverage of the top evidence, no model call
    Heuristic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub strategy: EvaluationStrategy,
    pub min_evidence: usize,
    /// Minimum combined score of the best item
    pub score_floor: f64,
    /// Evidence items shown to the judgment model
    pub judged_items: usize,
    pub coverage_threshold: f64,
    pub judgment_timeout_ms: u64,
    /// Overrides `llm.model` for judgment calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub temperature: f32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            strategy: EvaluationStrategy::default(),
            min_evidence: 2,
            score_floor: 0.5,
            judged_items: 5,
            coverage_threshold: 0.6,
            judgment_timeout_ms: 20_000,
            model: None,
            temperature: 0.0,
        }
    }
}

impl EvaluationConfig {
    pub fn judgment_timeout(&self) -> Duration {
        Duration::from_millis(self.judgment_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub timeout_ms: u64,
    /// Overrides `llm.model` for answer generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            model: None,
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Everything the orchestrator and its agents are tuned by
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub retrieval: RetrievalConfig,
    pub evaluation: EvaluationConfig,
    pub generation: GenerationConfig,
    /// Upper bound on retrieval rounds per query (local round included)
    pub max_rounds: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            retrieval: RetrievalConfig::default(),
            evaluation: EvaluationConfig::default(),
            generation: GenerationConfig::default(),
            max_rounds: 2,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        let scoring = &self.scoring;
        if scoring.semantic_weight < 0.0 || scoring.keyword_weight < 0.0 {
            return Err(DomainError::configuration(
                "Scoring weights must be non-negative",
            ));
        }
        let sum = scoring.semantic_weight + scoring.keyword_weight;
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(DomainError::configuration(format!(
                "Scoring weights must sum to 1, got {}",
                sum
            )));
        }
        if scoring.top_k == 0 {
            return Err(DomainError::configuration("top_k must be at least 1"));
        }
        if self.retrieval.candidate_k == 0 {
            return Err(DomainError::configuration("candidate_k must be at least 1"));
        }
        if self.max_rounds == 0 {
            return Err(DomainError::configuration("max_rounds must be at least 1"));
        }

        let evaluation = &self.evaluation;
        for (name, value) in [
            ("score_floor", evaluation.score_floor),
            ("coverage_threshold", evaluation.coverage_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
