//! Sufficiency judgment
//!
//! Cheap gates first (evidence count, best combined score), then either a
//! language model judgment or a query-term coverage heuristic. Any failure of
//! the judgment call maps to an ambiguous verdict.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{debug, warn};

use super::prompts::{format_evidence, render, JUDGMENT_PROMPT, JUDGMENT_SYSTEM_PROMPT};
use crate::domain::{
    with_timeout, Agent, AgentError, AgentRequest, AgentResult, AgentRole, Degradation,
    DomainError, EvaluationConfig, EvaluationStrategy, EvidenceSet, LlmProvider, LlmRequest,
    Query, Sufficiency, SufficiencyVerdict,
};
use crate::infrastructure::corpus::tokenize;
use crate::infrastructure::observability::{record_llm_call, LlmCallMetricParams};

const JUDGMENT_MAX_TOKENS: u32 = 300;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "og", "eller", "i", "på", "til", "af", "for", "med", "er", "det", "en", "et", "der",
        "den", "de", "som", "om", "at", "hvad", "hvor", "hvordan", "hvilke", "hvilken", "skal",
        "kan", "må", "jeg", "vi", "min", "mit", "mine", "være", "have", "har", "fra", "ved",
        "the", "a", "an", "of", "to", "in", "is", "are", "what", "how", "for", "and", "or",
    ]
    .into_iter()
    .collect()
});

pub struct ContextEvaluatorAgent {
    llm: Arc<dyn LlmProvider>,
    model: String,
    config: EvaluationConfig,
}

impl std::fmt::Debug for ContextEvaluatorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextEvaluatorAgent")
            .field("model", &self.model)
            .field("strategy", &self.config.strategy)
            .finish()
    }
}

impl ContextEvaluatorAgent {
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>, config: EvaluationConfig) -> Self {
        Self {
            llm,
            model: config.model.clone().unwrap_or_else(|| model.into()),
            config,
        }
    }

    /// Verdict plus the degradation recorded when the judgment call failed
    pub async fn evaluate(
        &self,
        query: &Query,
        evidence: &EvidenceSet,
    ) -> (SufficiencyVerdict, Option<Degradation>) {
        if evidence.len() < self.config.min_evidence {
            return (
                SufficiencyVerdict::insufficient(
                    format!(
                        "Found {} evidence items, at least {} required",
                        evidence.len(),
                        self.config.min_evidence
                    ),
                    1.0,
                ),
                None,
            );
        }

        let top_score = evidence.top_score();
        if top_score < self.config.score_floor {
            return (
                SufficiencyVerdict::insufficient(
                    format!(
                        "Best evidence score {:.2} is below the floor {:.2}",
                        top_score, self.config.score_floor
                    ),
                    1.0,
                ),
                None,
            );
        }

        match self.config.strategy {
            EvaluationStrategy::Heuristic => (self.coverage_verdict(query, evidence), None),
            EvaluationStrategy::Llm => match self.judge(query, evidence).await {
                Ok(verdict) => (verdict, None),
                Err(e) => {
                    warn!(error = %e, "Sufficiency judgment unavailable, treating as ambiguous");
                    let message = e.to_string();
                    (
                        SufficiencyVerdict::ambiguous(format!("Judgment unavailable: {}", message)),
                        Some(Degradation::judgment(message)),
                    )
                }
            },
        }
    }

    async fn judge(
        &self,
        query: &Query,
        evidence: &EvidenceSet,
    ) -> Result<SufficiencyVerdict, DomainError> {
        let prompt = render(
            JUDGMENT_PROMPT,
            &[
                ("query", query.text()),
                ("evidence", &format_evidence(evidence, self.config.judged_items)),
            ],
        );

        let request = LlmRequest::builder()
            .system(JUDGMENT_SYSTEM_PROMPT)
            .user(prompt)
            .temperature(self.config.temperature)
            .max_tokens(JUDGMENT_MAX_TOKENS)
            .build();

        let started = Instant::now();
        let result = with_timeout(
            "sufficiency_judgment",
            self.config.judgment_timeout(),
            self.llm.chat(&self.model, request),
        )
        .await;

        record_llm_call(LlmCallMetricParams {
            purpose: "judgment",
            model: &self.model,
            duration: started.elapsed(),
            success: result.is_ok(),
            input_tokens: result
                .as_ref()
                .ok()
                .and_then(|r| r.usage.as_ref())
                .map(|u| u64::from(u.prompt_tokens)),
            output_tokens: result
                .as_ref()
                .ok()
                .and_then(|r| r.usage.as_ref())
                .map(|u| u64::from(u.completion_tokens)),
        });

        let response = result?;
        let content = response
            .content()
            .ok_or_else(|| DomainError::provider(self.llm.provider_name(), "Empty judgment"))?;

        parse_judgment(content)
    }

    fn coverage_verdict(&self, query: &Query, evidence: &EvidenceSet) -> SufficiencyVerdict {
        let coverage = term_coverage(query.text(), evidence, self.config.judged_items);
        let threshold = self.config.coverage_threshold;
        let rationale = format!("Query term coverage {:.2}", coverage);

        if coverage >= threshold {
            SufficiencyVerdict::sufficient(rationale, coverage)
        } else if coverage < threshold / 2.0 {
            SufficiencyVerdict::insufficient(rationale, 1.0 - coverage)
        } else {
            SufficiencyVerdict::ambiguous(rationale)
        }
    }
}

#[derive(Debug, Deserialize)]
struct JudgmentResponse {
    verdict: String,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn parse_judgment(content: &str) -> Result<SufficiencyVerdict, DomainError> {
    let json = extract_json(content).unwrap_or(content);

    let parsed: JudgmentResponse = serde_json::from_str(json).map_err(|e| {
        debug!(response = content, "Malformed judgment response");
        DomainError::validation(format!("Invalid judgment response format: {}", e))
    })?;

    let sufficiency = Sufficiency::from_label(&parsed.verdict).ok_or_else(|| {
        DomainError::validation(format!("Unknown verdict label '{}'", parsed.verdict))
    })?;

    Ok(SufficiencyVerdict::new(
        sufficiency,
        parsed.rationale.unwrap_or_default(),
        parsed.confidence.unwrap_or(0.5),
    ))
}

/// Slice from the first `{` to the last `}`, tolerating code fences and prose
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Share of meaningful query terms present in the top evidence
fn term_coverage(query: &str, evidence: &EvidenceSet, items: usize) -> f64 {
    let terms: HashSet<String> = tokenize(query)
        .into_iter()
        .filter(|t| !STOP_WORDS.contains(t.as_str()))
        .collect();

    if terms.is_empty() {
        return 0.5;
    }

    let covered: HashSet<String> = evidence
        .iter()
        .take(items)
        .flat_map(|item| tokenize(item.content()))
        .filter(|t| terms.contains(t))
        .collect();

    covered.len() as f64 / terms.len() as f64
}

#[async_trait]
impl Agent for ContextEvaluatorAgent {
    fn role(&self) -> AgentRole {
        AgentRole::ContextEvaluator
    }

    async fn process(&self, request: AgentRequest<'_>) -> Result<AgentResult, AgentError> {
        let evidence = request.evidence_or_empty();

        let (verdict, degradation) = self.evaluate(request.query, &evidence).await;
        debug!(
            verdict = verdict.sufficiency.as_str(),
            confidence = verdict.confidence,
            evidence = evidence.len(),
            "Evidence evaluated"
        );

        let result = AgentResult::verdict(verdict);
        Ok(match degradation {
            Some(degradation) => result.with_degradation(degradation),
            None => result,
        })
    }
}
