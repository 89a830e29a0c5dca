//! Local corpus retrieval
//!
//! Runs the semantic and keyword rankings concurrently against the current
//! corpus snapshot and fuses whatever survives.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::{
    with_timeout, Agent, AgentError, AgentRequest, AgentResult, AgentRole, CorpusHandle,
    EvidenceItem, EvidenceSet, Provenance, RetrievalConfig, ScoredCandidate, ScoringConfig,
};
use crate::infrastructure::scoring::{FusedCandidate, HybridScorer};

#[derive(Debug)]
pub struct KnowledgeRetrieverAgent {
    corpus: CorpusHandle,
    scorer: HybridScorer,
    candidate_k: usize,
    timeout: Duration,
}

impl KnowledgeRetrieverAgent {
    pub fn new(corpus: CorpusHandle, scoring: &ScoringConfig, retrieval: &RetrievalConfig) -> Self {
        Self {
            corpus,
            scorer: HybridScorer::new(scoring),
            candidate_k: retrieval.candidate_k,
            timeout: retrieval.index_timeout(),
        }
    }

    /// Fused, fetched and ranked local evidence for `text`
    pub async fn retrieve(&self, text: &str) -> Result<EvidenceSet, AgentError> {
        let corpus = self.corpus.current();

        let (semantic, keyword) = tokio::join!(
            with_timeout(
                "semantic_search",
                self.timeout,
                corpus.semantic_search(text, self.candidate_k)
            ),
            with_timeout(
                "keyword_search",
                self.timeout,
                corpus.keyword_search(text, self.candidate_k)
            ),
        );

        let (semantic, keyword) = match (semantic, keyword) {
            (Err(semantic_error), Err(keyword_error)) => {
                return Err(AgentError::retrieval_unavailable(format!(
                    "semantic: {}; keyword: {}",
                    semantic_error, keyword_error
                )));
            }
            (semantic, keyword) => (
                survivor("semantic", semantic),
                survivor("keyword", keyword),
            ),
        };

        let fused = self.scorer.fuse(&semantic, &keyword);
        debug!(
            semantic = semantic.len(),
            keyword = keyword.len(),
            fused = fused.len(),
            "Rankings fused"
        );

        let fetches = fused.iter().map(|candidate| corpus.fetch(&candidate.id));
        let passages = join_all(fetches).await;

        let items: Vec<EvidenceItem> = fused
            .iter()
            .zip(passages)
            .filter_map(|(candidate, passage)| match passage {
                Ok(passage) => Some(to_item(candidate, passage.title, passage.content)),
                Err(e) => {
                    warn!(source = %candidate.id, error = %e, "Dropping unfetchable candidate");
                    None
                }
            })
            .collect();

        Ok(EvidenceSet::ranked(items, self.scorer.top_k()))
    }
}

fn survivor(
    ranking: &'static str,
    result: Result<Vec<ScoredCandidate>, crate::domain::DomainError>,
) -> Vec<ScoredCandidate> {
    result.unwrap_or_else(|e| {
        warn!(ranking, error = %e, "Ranking failed, continuing with the other signal");
        Vec::new()
    })
}

fn to_item(candidate: &FusedCandidate, title: Option<String>, content: String) -> EvidenceItem {
    let item = EvidenceItem::new(
        candidate.id.clone(),
        content,
        Provenance::Local,
        candidate.scores(),
    );

    match title {
        Some(title) => item.with_title(title),
        None => item,
    }
}

#[async_trait]
impl Agent for KnowledgeRetrieverAgent {
    fn role(&self) -> AgentRole {
        AgentRole::KnowledgeRetriever
    }

    async fn process(&self, request: AgentRequest<'_>) -> Result<AgentResult, AgentError> {
        let evidence = self.retrieve(request.query.text()).await?;
        Ok(AgentResult::evidence(evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::corpus::MockCorpusIndex;
    use crate::domain::{Passage, Query, RequestId, SourceId};

    fn passage(document: &str, chunk: u32, content: &str) -> Passage {
        Passage::new(SourceId::new(document, chunk), content).with_title(document)
    }

    fn agent(index: MockCorpusIndex) -> KnowledgeRetrieverAgent {
        let retrieval = RetrievalConfig {
            index_timeout_ms: 100,
            ..RetrievalConfig::default()
        };
        KnowledgeRetrieverAgent::new(
            CorpusHandle::new(Arc::new(index)),
            &ScoringConfig::default(),
            &retrieval,
        )
    }

    async fn run(agent: &KnowledgeRetrieverAgent, text: &str) -> Result<EvidenceSet, AgentError> {
        let query = Query::new(RequestId::new(1), text);
        let result = agent.process(AgentRequest::new(&query)).await?;
        Ok(result.into_evidence()?.0)
    }

    #[tokio::test]
    async fn test_retrieves_local_evidence_with_titles() {
        let index = MockCorpusIndex::new()
            .with_passage(passage("rumhøjde", 0, "Mindst 2,5 m."), 0.9, 6.0)
            .with_passage(passage("dagslys", 0, "Vinduesareal."), 0.4, 1.0);

        let evidence = run(&agent(index), "loftshøjde").await.unwrap();

        assert_eq!(evidence.len(), 2);
        let top = evidence.top().unwrap();
        assert_eq!(top.source(), &SourceId::new("rumhøjde", 0));
        assert_eq!(top.title(), Some("rumhøjde"));
        assert_eq!(top.provenance(), Provenance::Local);
        assert!((top.combined_score() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_single_ranking_failure_uses_survivor() {
        let index = MockCorpusIndex::new()
            .with_passage(passage("brand", 0, "Flugtveje."), 0.8, 3.0)
            .with_semantic_error("embedding service down");

        let evidence = run(&agent(index), "flugtvej").await.unwrap();

        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence.top().unwrap().semantic_score(), 0.0);
    }

    #[tokio::test]
    async fn test_both_rankings_failing_is_retrieval_unavailable() {
        let index = MockCorpusIndex::new()
            .with_semantic_error("down")
            .with_keyword_error("down");

        let error = run(&agent(index), "x").await.unwrap_err();

        assert!(matches!(error, AgentError::RetrievalUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_slow_ranking_times_out_as_failure() {
        let index = MockCorpusIndex::new()
            .with_passage(passage("a", 0, "A."), 0.9, 2.0)
            .with_semantic_delay(Duration::from_millis(500));

        let evidence = run(&agent(index), "a").await.unwrap();

        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence.top().unwrap().semantic_score(), 0.0);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_empty_set_not_error() {
        let evidence = run(&agent(MockCorpusIndex::new()), "noget").await.unwrap();
        assert!(evidence.is_empty());
    }

    #[tokio::test]
    async fn test_unfetchable_candidate_is_dropped() {
        let index = MockCorpusIndex::new()
            .with_passage(passage("kendt", 0, "Tekst."), 0.9, 2.0)
            .with_keyword(vec![
                ScoredCandidate::new(SourceId::new("kendt", 0), 2.0),
                ScoredCandidate::new(SourceId::new("ukendt", 0), 1.0),
            ]);

        let evidence = run(&agent(index), "tekst").await.unwrap();

        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence.top().unwrap().source(), &SourceId::new("kendt", 0));
    }
}
