//! Answer generation with citations
//!
//! Only a sufficient verdict or an explicit hedge request produces an answer.
//! Citations are drawn from the `[n]` markers in the produced text and never
//! point outside the evidence handed in.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::prompts::{
    format_evidence, render, GENERATION_PROMPT, GENERATION_SYSTEM_PROMPT, HEDGED_GENERATION_PROMPT,
    HEDGE_NOTICE, NO_CONTEXT_ANSWER, REFUSAL_ANSWER,
};
use crate::domain::{
    with_timeout, Agent, AgentError, AgentRequest, AgentResponse, AgentResult, AgentRole,
    Citation, EvidenceSet, FinishReason, GenerationConfig, LlmProvider, LlmRequest, Query,
};
use crate::infrastructure::corpus::tokenize;
use crate::infrastructure::observability::{record_llm_call, LlmCallMetricParams};

static CITATION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d{1,3})\]").unwrap());
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Minimum word overlap for attributing a sentence without markers
const MIN_SENTENCE_OVERLAP: f64 = 0.1;

pub struct GeneratorAgent {
    llm: Arc<dyn LlmProvider>,
    model: String,
    config: GenerationConfig,
}

impl std::fmt::Debug for GeneratorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorAgent")
            .field("model", &self.model)
            .field("timeout_ms", &self.config.timeout_ms)
            .finish()
    }
}

impl GeneratorAgent {
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            llm,
            model: config.model.clone().unwrap_or_else(|| model.into()),
            config,
        }
    }

    async fn complete(
        &self,
        query: &Query,
        evidence: &EvidenceSet,
        hedge: bool,
    ) -> Result<String, AgentError> {
        let template = if hedge {
            HEDGED_GENERATION_PROMPT
        } else {
            GENERATION_PROMPT
        };
        let prompt = render(
            template,
            &[
                ("query", query.text()),
                ("evidence", &format_evidence(evidence, evidence.len())),
            ],
        );

        let request = LlmRequest::builder()
            .system(GENERATION_SYSTEM_PROMPT)
            .user(prompt)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build();

        let started = Instant::now();
        let result = with_timeout(
            "generation",
            self.config.timeout(),
            self.llm.chat(&self.model, request),
        )
        .await;

        record_llm_call(LlmCallMetricParams {
            purpose: "generation",
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

        let response = result.map_err(|e| {
            warn!(error = %e, "Answer generation failed");
            AgentError::generation_failed(e.to_string())
        })?;

        if response.finish_reason == Some(FinishReason::Length) {
            warn!(max_tokens = self.config.max_tokens, "Answer truncated at the token limit");
        }

        response
            .content()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AgentError::generation_failed("Model returned an empty answer"))
    }
}

/// Citations for the markers used in `answer`, falling back to sentence overlap
pub fn cite(answer: &str, evidence: &EvidenceSet) -> Vec<Citation> {
    let markers = referenced_markers(answer, evidence.len());
    let markers = if markers.is_empty() {
        overlap_markers(answer, evidence)
    } else {
        markers
    };

    markers
        .into_iter()
        .filter_map(|marker| {
            evidence
                .get(marker - 1)
                .map(|item| Citation::from_item(marker, item))
        })
        .collect()
}

/// Distinct in-range `[n]` markers, ascending
fn referenced_markers(answer: &str, available: usize) -> Vec<usize> {
    let markers: BTreeMap<usize, ()> = CITATION_MARKER
        .captures_iter(answer)
        .filter_map(|c| c[1].parse::<usize>().ok())
        .filter(|n| (1..=available).contains(n))
        .map(|n| (n, ()))
        .collect();

    markers.into_keys().collect()
}

/// Attribute each sentence to its best-overlapping item, weighted by score
fn overlap_markers(answer: &str, evidence: &EvidenceSet) -> Vec<usize> {
    let item_words: Vec<HashSet<String>> = evidence
        .iter()
        .map(|item| tokenize(item.content()).into_iter().collect())
        .collect();

    let mut markers = BTreeMap::new();
    for sentence in SENTENCE_END.split(answer) {
        let words: HashSet<String> = tokenize(sentence).into_iter().collect();
        if words.is_empty() {
            continue;
        }

        let best = item_words
            .iter()
            .zip(evidence.iter())
            .enumerate()
            .filter_map(|(index, (item_words, item))| {
                let overlap = jaccard(&words, item_words);
                (overlap > MIN_SENTENCE_OVERLAP)
                    .then(|| (index, overlap * item.combined_score().max(f64::EPSILON)))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));

        if let Some((index, _)) = best {
            markers.insert(index + 1, ());
        }
    }

    markers.into_keys().collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[async_trait]
impl Agent for GeneratorAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Generator
    }

    async fn process(&self, request: AgentRequest<'_>) -> Result<AgentResult, AgentError> {
        let evidence = request.evidence_or_empty();
        let sufficient = request.verdict.is_some_and(|v| v.is_sufficient());

        if !sufficient && !request.hedge {
            debug!("Refusing to answer without sufficient evidence");
            return Ok(AgentResult::response(AgentResponse::insufficient_evidence(
                REFUSAL_ANSWER,
            )));
        }

        if evidence.is_empty() {
            let response = if request.hedge {
                AgentResponse::answered(NO_CONTEXT_ANSWER, Vec::new()).hedged()
            } else {
                AgentResponse::insufficient_evidence(REFUSAL_ANSWER)
            };
            return Ok(AgentResult::response(response));
        }

        let hedge = request.hedge && !sufficient;
        let text = self.complete(request.query, &evidence, hedge).await?;
        let citations = cite(&text, &evidence);
        debug!(citations = citations.len(), hedged = hedge, "Answer generated");

        let response = if hedge {
            AgentResponse::answered(format!("{}\n\n{}", HEDGE_NOTICE, text), citations).hedged()
        } else {
            AgentResponse::answered(text, citations)
        };

        Ok(AgentResult::response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::llm::MockLlmProvider;
    use crate::domain::{
        EvidenceItem, EvidenceScores, Provenance, RequestId, ResponseStatus, SourceId,
        SufficiencyVerdict,
    };

    fn evidence() -> EvidenceSet {
        EvidenceSet::ranked(
            vec![
                EvidenceItem::new(
                    SourceId::new("rumhøjde", 0),
                    "Loftshøjden i beboelsesrum skal være mindst 2,5 m.",
                    Provenance::Local,
                    EvidenceScores::new(0.9, 5.0, 1.0),
                )
                .with_title("Rumhøjde"),
                EvidenceItem::new(
                    SourceId::new("dagslys", 0),
                    "Dagslys i beboelsesrum sikres med vinduesareal på 10 pct.",
                    Provenance::Local,
                    EvidenceScores::new(0.6, 2.0, 0.6),
                ),
            ],
            8,
        )
    }

    fn generator(llm: Arc<MockLlmProvider>) -> GeneratorAgent {
        let config = GenerationConfig {
            timeout_ms: 100,
            ..GenerationConfig::default()
        };
        GeneratorAgent::new(llm, "gen-model", config)
    }

    async fn generate(
        agent: &GeneratorAgent,
        evidence: &EvidenceSet,
        verdict: &SufficiencyVerdict,
        hedge: bool,
    ) -> Result<AgentResponse, AgentError> {
        let query = Query::new(RequestId::new(1), "Hvad er minimumshøjden for beboelsesrum?");
        let request = AgentRequest::new(&query)
            .with_evidence(evidence)
            .with_verdict(verdict)
            .with_hedge(hedge);
        Ok(agent.process(request).await?.into_response()?.0)
    }

    #[tokio::test]
    async fn test_sufficient_answer_cites_referenced_items_only() {
        let llm = Arc::new(
            MockLlmProvider::new("mock").with_content("Loftshøjden skal være mindst 2,5 m [1]. Se også [7]."),
        );
        let evidence = evidence();

        let response = generate(
            &generator(llm),
            &evidence,
            &SufficiencyVerdict::sufficient("ok", 0.9),
            false,
        )
        .await
        .unwrap();

        assert_eq!(response.status, ResponseStatus::Answered);
        assert!(!response.hedged);
        assert_eq!(response.citations.len(), 1);
        assert_eq!(response.citations[0].marker, 1);
        assert_eq!(response.citations[0].source, SourceId::new("rumhøjde", 0));
    }

    #[tokio::test]
    async fn test_insufficient_without_hedge_refuses() {
        let llm = Arc::new(MockLlmProvider::new("mock").with_content("svar"));
        let evidence = evidence();

        for verdict in [
            SufficiencyVerdict::insufficient("few", 1.0),
            SufficiencyVerdict::ambiguous("unclear"),
        ] {
            let response = generate(&generator(llm.clone()), &evidence, &verdict, false)
                .await
                .unwrap();

            assert_eq!(response.status, ResponseStatus::InsufficientEvidence);
            assert!(response.citations.is_empty());
        }
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_hedged_answer_acknowledges_uncertainty() {
        let llm = Arc::new(MockLlmProvider::new("mock").with_content("Muligvis 2,5 m [1]."));
        let evidence = evidence();

        let response = generate(
            &generator(llm.clone()),
            &evidence,
            &SufficiencyVerdict::ambiguous("unclear"),
            true,
        )
        .await
        .unwrap();

        assert!(response.is_answered());
        assert!(response.hedged);
        assert!(response.answer.starts_with(HEDGE_NOTICE));
        assert_eq!(response.citations.len(), 1);
        assert!(llm.last_request().unwrap().user_text().contains("ufuldstændig"));
    }

    #[tokio::test]
    async fn test_hedge_with_no_evidence_skips_llm() {
        let llm = Arc::new(MockLlmProvider::new("mock").with_content("svar"));

        let response = generate(
            &generator(llm.clone()),
            &EvidenceSet::empty(),
            &SufficiencyVerdict::insufficient("none", 1.0),
            true,
        )
        .await
        .unwrap();

        assert!(response.is_answered());
        assert!(response.hedged);
        assert_eq!(response.answer, NO_CONTEXT_ANSWER);
        assert!(response.citations.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_llm_failure_is_generation_failed() {
        let llm = Arc::new(MockLlmProvider::new("mock").with_error("HTTP 502"));
        let evidence = evidence();

        let error = generate(
            &generator(llm),
            &evidence,
            &SufficiencyVerdict::sufficient("ok", 1.0),
            false,
        )
        .await
        .unwrap_err();

        assert!(matches!(error, AgentError::GenerationFailed { .. }));
    }

    #[tokio::test]
    async fn test_llm_timeout_is_generation_failed() {
        let llm = Arc::new(
            MockLlmProvider::new("mock")
                .with_content("sent")
                .with_delay(Duration::from_millis(500)),
        );
        let evidence = evidence();

        let error = generate(
            &generator(llm),
            &evidence,
            &SufficiencyVerdict::sufficient("ok", 1.0),
            false,
        )
        .await
        .unwrap_err();

        assert!(matches!(error, AgentError::GenerationFailed { .. }));
    }

    #[test]
    fn test_cite_falls_back_to_sentence_overlap() {
        let evidence = evidence();
        let citations = cite(
            "Dagslys i beboelsesrum kræver et vinduesareal på 10 pct. Det er alt.",
            &evidence,
        );

        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].marker, 2);
        assert_eq!(citations[0].source, SourceId::new("dagslys", 0));
    }

    #[test]
    fn test_cite_ignores_out_of_range_and_duplicates() {
        let evidence = evidence();
        let citations = cite("A [2]. B [2]. C [0]. D [1].", &evidence);

        let markers: Vec<usize> = citations.iter().map(|c| c.marker).collect();
        assert_eq!(markers, vec![1, 2]);
    }
}
