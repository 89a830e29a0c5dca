//! Web escalation
//!
//! Best effort: provider failures and timeouts yield an empty evidence set
//! plus a degradation note, never an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{
    with_timeout, Agent, AgentError, AgentRequest, AgentResult, AgentRole, Degradation,
    EvidenceItem, EvidenceScores, EvidenceSet, Provenance, RetrievalConfig, ScoringConfig,
    SourceId, WebResult, WebSearchProvider,
};
use crate::infrastructure::scoring::min_max_normalize;

pub struct WebSearchAgent {
    provider: Arc<dyn WebSearchProvider>,
    timeout: Duration,
    max_results: usize,
    top_k: usize,
    context_terms: Vec<String>,
    query_suffix: String,
}

impl std::fmt::Debug for WebSearchAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearchAgent")
            .field("provider", &self.provider.provider_name())
            .field("timeout", &self.timeout)
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl WebSearchAgent {
    pub fn new(
        provider: Arc<dyn WebSearchProvider>,
        scoring: &ScoringConfig,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            provider,
            timeout: retrieval.web_timeout(),
            max_results: retrieval.web_max_results,
            top_k: scoring.top_k,
            context_terms: retrieval
                .web_context_terms
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            query_suffix: retrieval.web_query_suffix.clone(),
        }
    }

    /// Append the regulatory context suffix unless the query already names it
    pub fn reformulate(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let has_context = self.context_terms.iter().any(|t| lowered.contains(t.as_str()));

        if has_context || self.query_suffix.is_empty() {
            text.to_string()
        } else {
            format!("{} {}", text.trim(), self.query_suffix)
        }
    }

    fn to_evidence(&self, results: Vec<WebResult>) -> EvidenceSet {
        let results: Vec<WebResult> = results
            .into_iter()
            .filter(|r| !r.url.is_empty() && !r.snippet.trim().is_empty())
            .collect();

        let raw: Vec<f64> = results.iter().map(|r| r.score).collect();
        let normalized = min_max_normalize(&raw);

        let items = results
            .into_iter()
            .zip(normalized)
            .map(|(result, combined)| {
                let item = EvidenceItem::new(
                    SourceId::url(result.url),
                    result.snippet,
                    Provenance::Web,
                    EvidenceScores::new(result.score, 0.0, combined),
                );
                if result.title.is_empty() {
                    item
                } else {
                    item.with_title(result.title)
                }
            })
            .collect();

        EvidenceSet::ranked(items, self.top_k)
    }
}

#[async_trait]
impl Agent for WebSearchAgent {
    fn role(&self) -> AgentRole {
        AgentRole::WebSearch
    }

    async fn process(&self, request: AgentRequest<'_>) -> Result<AgentResult, AgentError> {
        let search_query = self.reformulate(request.query.text());
        debug!(
            provider = self.provider.provider_name(),
            query = %search_query,
            "Searching the web"
        );

        let outcome = with_timeout(
            "web_search",
            self.timeout,
            self.provider.search(&search_query, self.max_results),
        )
        .await;

        match outcome {
            Ok(results) => {
                let evidence = self.to_evidence(results);
                debug!(items = evidence.len(), "Web search returned evidence");
                Ok(AgentResult::evidence(evidence))
            }
            Err(e) => {
                warn!(
                    provider = self.provider.provider_name(),
                    error = %e,
                    "Web search degraded, continuing without it"
                );
                Ok(AgentResult::evidence(EvidenceSet::empty())
                    .with_degradation(Degradation::provider(e.to_string())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::web_search::MockWebSearchProvider;
    use crate::domain::{DomainError, Query, RequestId};
    use mockall::predicate::{always, eq};

    fn agent(provider: MockWebSearchProvider, timeout_ms: u64) -> WebSearchAgent {
        let retrieval = RetrievalConfig {
            web_timeout_ms: timeout_ms,
            ..RetrievalConfig::default()
        };
        WebSearchAgent::new(Arc::new(provider), &ScoringConfig::default(), &retrieval)
    }

    fn named(mut provider: MockWebSearchProvider) -> MockWebSearchProvider {
        provider.expect_provider_name().return_const("mock");
        provider
    }

    async fn run(agent: &WebSearchAgent, text: &str) -> (EvidenceSet, Vec<Degradation>) {
        let query = Query::new(RequestId::new(1), text);
        agent
            .process(AgentRequest::new(&query))
            .await
            .unwrap()
            .into_evidence()
            .unwrap()
    }

    #[test]
    fn test_reformulate_appends_context_when_missing() {
        let agent = agent(named(MockWebSearchProvider::new()), 1000);

        assert_eq!(
            agent.reformulate("krav til altanværn"),
            "krav til altanværn bygningsreglement Danmark"
        );
        assert_eq!(agent.reformulate("BR18 altanværn"), "BR18 altanværn");
        assert_eq!(
            agent.reformulate("Bygningsreglementet om altaner"),
            "Bygningsreglementet om altaner"
        );
    }

    #[tokio::test]
    async fn test_results_become_normalized_web_evidence() {
        let mut provider = named(MockWebSearchProvider::new());
        provider
            .expect_search()
            .with(eq("altanværn bygningsreglement Danmark"), eq(5))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    WebResult::new("https://brs.dk/a", "Værn skal være 1,2 m.", 1.2)
                        .with_title("Altaner"),
                    WebResult::new("https://example.dk/b", "Andet.", 0.5),
                    WebResult::new("https://example.dk/c", "   ", 0.4),
                ])
            });

        let (evidence, degradations) = run(&agent(provider, 1000), "altanværn").await;

        assert!(degradations.is_empty());
        assert_eq!(evidence.len(), 2);
        let top = evidence.top().unwrap();
        assert_eq!(top.provenance(), Provenance::Web);
        assert_eq!(top.source(), &SourceId::url("https://brs.dk/a"));
        assert_eq!(top.title(), Some("Altaner"));
        assert_eq!(top.combined_score(), 1.0);
        assert_eq!(top.semantic_score(), 1.2);
        assert_eq!(evidence.get(1).unwrap().combined_score(), 0.0);
    }

    #[tokio::test]
    async fn test_single_hit_carries_no_combined_score() {
        let mut provider = named(MockWebSearchProvider::new());
        provider.expect_search().times(1).returning(|_, _| {
            Ok(vec![WebResult::new("https://brs.dk/a", "Værn skal være 1,2 m.", 1.2)])
        });

        let (evidence, _) = run(&agent(provider, 1000), "BR18 altanværn").await;

        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence.top().unwrap().semantic_score(), 1.2);
        assert_eq!(evidence.top_score(), 0.0);
    }

    #[tokio::test]
    async fn test_provider_error_degrades_to_empty_set() {
        let mut provider = named(MockWebSearchProvider::new());
        provider
            .expect_search()
            .with(always(), always())
            .times(1)
            .returning(|_, _| Err(DomainError::provider("duckduckgo", "HTTP 503")));

        let (evidence, degradations) = run(&agent(provider, 1000), "br18 brand").await;

        assert!(evidence.is_empty());
        assert_eq!(degradations.len(), 1);
        assert!(matches!(degradations[0], Degradation::ProviderDegraded { .. }));
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_empty_set() {
        let provider = SlowProvider;
        let retrieval = RetrievalConfig {
            web_timeout_ms: 20,
            ..RetrievalConfig::default()
        };
        let agent = WebSearchAgent::new(Arc::new(provider), &ScoringConfig::default(), &retrieval);

        let (evidence, degradations) = run(&agent, "br18").await;

        assert!(evidence.is_empty());
        match &degradations[0] {
            Degradation::ProviderDegraded { message } => assert!(message.contains("web_search exceeded")),
            other => panic!("unexpected degradation {:?}", other),
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl WebSearchProvider for SlowProvider {
        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<WebResult>, DomainError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(Vec::new())
        }

        fn provider_name(&self) -> &'static str {
            "slow"
        }
    }
}
