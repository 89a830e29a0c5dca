//! Query orchestration
//!
//! Drives one query through
//! `Routing -> Retrieving -> Evaluating -> [Escalating -> Retrieving] -> Generating -> Done`,
//! with `Failed` reachable from every phase. Round 1 searches the local corpus;
//! every later round escalates to the web. Cancellation is honoured at each
//! phase boundary.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, info_span, warn, Instrument};

use crate::domain::{
    Agent, AgentError, AgentRequest, AgentResponse, AgentRole, CancellationToken, DomainError,
    EngineConfig, FailureKind, OrchestrationState, Phase, Provenance, Query, RoutingHint,
    Sufficiency,
};
use crate::infrastructure::observability::{
    record_degradation, record_escalation, record_query_outcome, record_retrieval,
};
use crate::infrastructure::scoring::HybridScorer;

pub struct Orchestrator {
    retriever: Arc<dyn Agent>,
    web_search: Arc<dyn Agent>,
    evaluator: Arc<dyn Agent>,
    generator: Arc<dyn Agent>,
    scorer: HybridScorer,
    max_rounds: u32,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("max_rounds", &self.max_rounds)
            .field("top_k", &self.scorer.top_k())
            .finish()
    }
}

impl Orchestrator {
    /// Wire the four agents, checking each one sits in its own slot
    pub fn new(
        retriever: Arc<dyn Agent>,
        web_search: Arc<dyn Agent>,
        evaluator: Arc<dyn Agent>,
        generator: Arc<dyn Agent>,
        config: &EngineConfig,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        for (agent, expected) in [
            (&retriever, AgentRole::KnowledgeRetriever),
            (&web_search, AgentRole::WebSearch),
            (&evaluator, AgentRole::ContextEvaluator),
            (&generator, AgentRole::Generator),
        ] {
            if agent.role() != expected {
                return Err(DomainError::configuration(format!(
                    "Agent in the {} slot reports role {}",
                    expected,
                    agent.role()
                )));
            }
        }

        Ok(Self {
            retriever,
            web_search,
            evaluator,
            generator,
            scorer: HybridScorer::new(&config.scoring),
            max_rounds: config.max_rounds,
        })
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Answer one query; always yields a well-formed response
    pub async fn run(&self, query: &Query, cancel: &CancellationToken) -> AgentResponse {
        let started = Instant::now();
        let span = info_span!("orchestration", request_id = %query.id());

        let response = self.drive(query, cancel).instrument(span).await;

        record_query_outcome(
            response.status.as_str(),
            response.hedged,
            response.rounds,
            started.elapsed(),
        );
        for degradation in &response.degradations {
            record_degradation(degradation.kind());
        }

        response
    }

    async fn drive(&self, query: &Query, cancel: &CancellationToken) -> AgentResponse {
        let mut state = OrchestrationState::new(query.id());
        let mut answer: Option<AgentResponse> = None;

        loop {
            if cancel.is_cancelled() && !state.phase().is_terminal() {
                info!(phase = %state.phase(), "Run cancelled");
                state.record_error(AgentError::Cancelled);
                state.fail(FailureKind::Cancelled);
            }

            match state.phase() {
                Phase::Routing => {
                    if query.routing_hint() == Some(RoutingHint::PreferFresh) {
                        info!("Fresh sources requested, starting with the local corpus");
                    }
                    state.begin_round();
                }
                Phase::Retrieving { round } => self.retrieve(query, round, &mut state).await,
                Phase::Evaluating { round } => self.evaluate(query, round, &mut state).await,
                Phase::Escalating { round } => {
                    record_escalation(round + 1);
                    info!(round = round + 1, "Escalating to web search");
                    state.begin_round();
                }
                Phase::Generating { hedge } => match self.generate(query, hedge, &mut state).await {
                    Ok(response) => {
                        answer = Some(response);
                        state.transition(Phase::Done);
                    }
                    Err(e) => self.fail(&mut state, e),
                },
                Phase::Done => {
                    let Some(response) = answer.take() else {
                        self.fail(&mut state, AgentError::internal("Done without a response"));
                        continue;
                    };
                    info!(
                        status = response.status.as_str(),
                        hedged = response.hedged,
                        citations = response.citations.len(),
                        rounds = state.round(),
                        "Query answered"
                    );
                    return finish(response, state);
                }
                Phase::Failed(kind) => {
                    return finish(AgentResponse::error(kind.user_message()), state);
                }
            }
        }
    }

    async fn retrieve(&self, query: &Query, round: u32, state: &mut OrchestrationState) {
        let (agent, provenance) = if round == 1 {
            (&self.retriever, Provenance::Local)
        } else {
            (&self.web_search, Provenance::Web)
        };

        let outcome = agent
            .process(AgentRequest::new(query))
            .await
            .and_then(|result| result.into_evidence());

        match outcome {
            Ok((evidence, degradations)) => {
                record_retrieval(provenance.as_str(), evidence.len());
                info!(
                    round,
                    provenance = provenance.as_str(),
                    items = evidence.len(),
                    "Evidence retrieved"
                );
                state.record_degradations(degradations);
                state.evidence = self.scorer.merge(&state.evidence, &evidence);
                state.transition(Phase::Evaluating { round });
            }
            Err(e) => self.fail(state, e),
        }
    }

    async fn evaluate(&self, query: &Query, round: u32, state: &mut OrchestrationState) {
        let outcome = self
            .evaluator
            .process(AgentRequest::new(query).with_evidence(&state.evidence))
            .await
            .and_then(|result| result.into_verdict());

        let (verdict, degradations) = match outcome {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(state, e),
        };

        info!(
            round,
            verdict = verdict.sufficiency.as_str(),
            confidence = verdict.confidence,
            evidence = state.evidence.len(),
            "Evidence evaluated"
        );

        let next = match verdict.sufficiency {
            Sufficiency::Sufficient => Phase::Generating { hedge: false },
            Sufficiency::Insufficient if round < self.max_rounds => Phase::Escalating { round },
            Sufficiency::Insufficient | Sufficiency::Ambiguous => Phase::Generating { hedge: true },
        };

        state.record_degradations(degradations);
        state.last_verdict = Some(verdict);
        state.transition(next);
    }

    async fn generate(
        &self,
        query: &Query,
        hedge: bool,
        state: &mut OrchestrationState,
    ) -> Result<AgentResponse, AgentError> {
        let verdict = state
            .last_verdict
            .as_ref()
            .ok_or_else(|| AgentError::internal("Generating without a verdict"))?;

        let request = AgentRequest::new(query)
            .with_evidence(&state.evidence)
            .with_verdict(verdict)
            .with_hedge(hedge);

        let (response, degradations) = self.generator.process(request).await?.into_response()?;
        state.record_degradations(degradations);

        Ok(response)
    }

    fn fail(&self, state: &mut OrchestrationState, error: AgentError) {
        let kind = FailureKind::from_error(&error);
        error!(phase = %state.phase(), failure = kind.as_str(), error = %error, "Run failed");
        state.record_error(error);
        state.fail(kind);
    }
}

fn finish(response: AgentResponse, state: OrchestrationState) -> AgentResponse {
    if !state.errors.is_empty() {
        let errors = state
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        warn!(count = state.errors.len(), errors = %errors, "Run ended with agent errors");
    }

    let rounds = state.round();
    response
        .with_request_id(state.request_id)
        .with_degradations(state.degradations)
        .with_rounds(rounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::domain::corpus::MockCorpusIndex;
    use crate::domain::llm::MockLlmProvider;
    use crate::domain::web_search::MockWebSearchProvider;
    use crate::domain::{
        AgentResult, CorpusHandle, Degradation, EvaluationConfig, EvaluationStrategy,
        EvidenceSet, Passage, RequestId, ResponseStatus, SourceId, WebResult,
    };
    use crate::infrastructure::agents::{
        ContextEvaluatorAgent, GeneratorAgent, KnowledgeRetrieverAgent, WebSearchAgent,
        HEDGE_NOTICE, NO_CONTEXT_ANSWER,
    };

    const SUFFICIENT: &str = r#"{"verdict": "sufficient", "rationale": "dækket", "confidence": 0.9}"#;
    const INSUFFICIENT: &str = r#"{"verdict": "insufficient", "rationale": "mangler", "confidence": 0.8}"#;

    struct Engine {
        corpus: Arc<MockCorpusIndex>,
        web: MockWebSearchProvider,
        judge: MockLlmProvider,
        writer: MockLlmProvider,
        config: EngineConfig,
    }

    impl Engine {
        fn new() -> Self {
            let mut web = MockWebSearchProvider::new();
            web.expect_provider_name().return_const("mock");
            Self {
                corpus: Arc::new(MockCorpusIndex::new()),
                web,
                judge: MockLlmProvider::new("judge").with_content(SUFFICIENT),
                writer: MockLlmProvider::new("writer").with_content("Mindst 2,5 m [1]."),
                config: EngineConfig::default(),
            }
        }

        fn with_corpus(mut self, corpus: MockCorpusIndex) -> Self {
            self.corpus = Arc::new(corpus);
            self
        }

        fn build(self) -> (Orchestrator, Arc<MockCorpusIndex>) {
            let config = self.config;
            let corpus = self.corpus;
            let handle = CorpusHandle::new(corpus.clone());

            let retriever =
                KnowledgeRetrieverAgent::new(handle, &config.scoring, &config.retrieval);
            let web = WebSearchAgent::new(Arc::new(self.web), &config.scoring, &config.retrieval);
            let evaluator =
                ContextEvaluatorAgent::new(Arc::new(self.judge), "judge", config.evaluation.clone());
            let generator =
                GeneratorAgent::new(Arc::new(self.writer), "writer", config.generation.clone());

            let orchestrator = Orchestrator::new(
                Arc::new(retriever),
                Arc::new(web),
                Arc::new(evaluator),
                Arc::new(generator),
                &config,
            )
            .unwrap();

            (orchestrator, corpus)
        }
    }

    fn ceiling_corpus() -> MockCorpusIndex {
        let passage = |chunk: u32, text: &str| {
            Passage::new(SourceId::new("br18-rumhøjde", chunk), text).with_title("Rumhøjde")
        };
        MockCorpusIndex::new()
            .with_passage(passage(0, "Loftshøjden i beboelsesrum skal være mindst 2,5 m."), 0.92, 7.1)
            .with_passage(passage(1, "I tagetager gælder højden over halvdelen af gulvarealet."), 0.85, 5.3)
            .with_passage(passage(2, "Rumhøjden måles fra færdigt gulv til færdigt loft."), 0.81, 4.0)
    }

    fn query(text: &str) -> Query {
        Query::new(RequestId::new(7), text)
    }

    #[tokio::test]
    async fn test_ceiling_height_answered_locally() {
        let mut engine = Engine::new().with_corpus(ceiling_corpus());
        engine.web.expect_search().times(0);
        let (orchestrator, _) = engine.build();

        let response = orchestrator
            .run(
                &query("Hvad er minimumshøjden for beboelsesrum?"),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(response.status, ResponseStatus::Answered);
        assert!(!response.hedged);
        assert_eq!(response.rounds, 1);
        assert_eq!(response.request_id, Some(RequestId::new(7)));
        assert_eq!(response.citations.len(), 1);
        assert_eq!(response.citations[0].source, SourceId::new("br18-rumhøjde", 0));
        assert!(response.degradations.is_empty());
    }

    #[tokio::test]
    async fn test_absent_topic_escalates_once_then_hedges() {
        let mut engine = Engine::new();
        engine
            .web
            .expect_search()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        let (orchestrator, _) = engine.build();

        let response = orchestrator
            .run(&query("Regler for rumraketter på taget"), &CancellationToken::new())
            .await;

        assert_eq!(response.status, ResponseStatus::Answered);
        assert!(response.hedged);
        assert_eq!(response.answer, NO_CONTEXT_ANSWER);
        assert!(response.citations.is_empty());
        assert_eq!(response.rounds, 2);
    }

    #[tokio::test]
    async fn test_both_index_calls_failing_fails_the_run() {
        let mut engine = Engine::new().with_corpus(
            MockCorpusIndex::new()
                .with_semantic_error("vector store down")
                .with_keyword_error("bm25 down"),
        );
        engine.web.expect_search().times(0);
        let (orchestrator, _) = engine.build();

        let response = orchestrator
            .run(&query("Hvad er kravet?"), &CancellationToken::new())
            .await;

        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(
            response.answer,
            FailureKind::LocalIndexUnavailable.user_message()
        );
        assert!(response.citations.is_empty());
        assert_eq!(response.rounds, 1);
    }

    #[tokio::test]
    async fn test_rounds_never_exceed_max() {
        let mut engine = Engine::new();
        engine.config.max_rounds = 3;
        engine.judge = MockLlmProvider::new("judge").with_content(INSUFFICIENT);
        engine.writer = MockLlmProvider::new("writer").with_content("Det er usikkert.");
        engine.web.expect_search().times(2).returning(|_, _| {
            Ok(vec![WebResult::new("https://example.dk/x", "Lidt om emnet.", 0.3)])
        });
        let (orchestrator, _) = engine.build();

        let response = orchestrator
            .run(&query("Noget sjældent"), &CancellationToken::new())
            .await;

        assert_eq!(response.rounds, 3);
        assert!(response.hedged);
        assert!(response.answer.starts_with(HEDGE_NOTICE));
    }

    #[tokio::test]
    async fn test_ambiguous_judgment_hedges_without_escalating() {
        let mut engine = Engine::new().with_corpus(ceiling_corpus());
        engine.judge = MockLlmProvider::new("judge").with_content("det ved jeg ikke");
        engine.web.expect_search().times(0);
        let (orchestrator, _) = engine.build();

        let response = orchestrator
            .run(&query("Hvad er minimumshøjden?"), &CancellationToken::new())
            .await;

        assert!(response.is_answered());
        assert!(response.hedged);
        assert_eq!(response.rounds, 1);
        assert!(matches!(
            response.degradations.as_slice(),
            [Degradation::JudgmentUnavailable { .. }]
        ));
    }

    #[tokio::test]
    async fn test_web_failure_is_degradation_not_error() {
        let mut engine = Engine::new();
        engine
            .web
            .expect_search()
            .times(1)
            .returning(|_, _| Err(DomainError::provider("duckduckgo", "HTTP 503")));
        let (orchestrator, _) = engine.build();

        let response = orchestrator
            .run(&query("Krav til ukendt emne"), &CancellationToken::new())
            .await;

        assert!(response.is_answered());
        assert!(response.hedged);
        assert!(matches!(
            response.degradations.as_slice(),
            [Degradation::ProviderDegraded { .. }]
        ));
    }

    #[tokio::test]
    async fn test_keyword_only_evidence_stays_below_floor_and_escalates() {
        let mut engine = Engine::new()
            .with_corpus(ceiling_corpus().with_semantic_error("embedding service down"));
        engine
            .web
            .expect_search()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        let (orchestrator, _) = engine.build();

        let response = orchestrator
            .run(&query("Hvad er minimumshøjden?"), &CancellationToken::new())
            .await;

        assert!(response.is_answered());
        assert!(response.hedged);
        assert_eq!(response.rounds, 2);
        assert!(response.answer.starts_with(HEDGE_NOTICE));
    }

    #[tokio::test]
    async fn test_generation_failure_fails_the_run() {
        let mut engine = Engine::new().with_corpus(ceiling_corpus());
        engine.writer = MockLlmProvider::new("writer").with_error("HTTP 500");
        let (orchestrator, _) = engine.build();

        let response = orchestrator
            .run(&query("Hvad er minimumshøjden?"), &CancellationToken::new())
            .await;

        assert!(response.is_error());
        assert_eq!(response.answer, FailureKind::GenerationFailed.user_message());
        assert!(response.citations.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_does_no_work() {
        let (orchestrator, corpus) = Engine::new().with_corpus(ceiling_corpus()).build();
        let token = CancellationToken::new();
        token.cancel();

        let response = orchestrator.run(&query("x"), &token).await;

        assert!(response.is_error());
        assert_eq!(response.answer, FailureKind::Cancelled.user_message());
        assert_eq!(corpus.search_count(), 0);
        assert_eq!(response.rounds, 0);
    }

    #[tokio::test]
    async fn test_heuristic_strategy_needs_no_judgment_model() {
        let mut engine = Engine::new().with_corpus(ceiling_corpus());
        engine.config.evaluation = EvaluationConfig {
            strategy: EvaluationStrategy::Heuristic,
            ..EvaluationConfig::default()
        };
        engine.judge = MockLlmProvider::new("judge").with_error("must not be called");
        let (orchestrator, _) = engine.build();

        let response = orchestrator
            .run(&query("loftshøjden i beboelsesrum"), &CancellationToken::new())
            .await;

        assert!(response.is_answered());
        assert!(!response.hedged);
    }

    /// Cancels the shared token while retrieving, then reports one weak item
    struct CancellingRetriever {
        token: CancellationToken,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Agent for CancellingRetriever {
        fn role(&self) -> AgentRole {
            AgentRole::KnowledgeRetriever
        }

        async fn process(&self, _request: AgentRequest<'_>) -> Result<AgentResult, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.token.cancel();
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(AgentResult::evidence(EvidenceSet::empty()))
        }
    }

    #[tokio::test]
    async fn test_cancellation_takes_effect_at_next_boundary() {
        let token = CancellationToken::new();
        let retriever = Arc::new(CancellingRetriever {
            token: token.clone(),
            calls: AtomicUsize::new(0),
        });
        let mut engine = Engine::new();
        engine.web.expect_search().times(0);
        let (built, _) = engine.build();

        let orchestrator = Orchestrator::new(
            retriever.clone(),
            built.web_search.clone(),
            built.evaluator.clone(),
            built.generator.clone(),
            &EngineConfig::default(),
        )
        .unwrap();

        let response = orchestrator.run(&query("x"), &token).await;

        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
        assert!(response.is_error());
        assert_eq!(response.answer, FailureKind::Cancelled.user_message());
    }

    #[test]
    fn test_rejects_agent_in_wrong_slot() {
        let (built, _) = Engine::new().build();

        let error = Orchestrator::new(
            built.generator.clone(),
            built.web_search.clone(),
            built.evaluator.clone(),
            built.generator.clone(),
            &EngineConfig::default(),
        )
        .unwrap_err();

        assert!(error.to_string().contains("knowledge_retriever slot"));
    }
}
