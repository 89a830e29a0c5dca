//! Regulation RAG Agent
//!
//! Agentic question answering over the Danish building regulations:
//! - Hybrid semantic + keyword retrieval over a local corpus
//! - LLM sufficiency judgment with web search escalation
//! - Cited answers, hedged when the evidence stays incomplete

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use api::state::AppState;
use domain::{CorpusBuilder, CorpusHandle, EmbeddingProvider, LlmProvider, WebSearchProvider};
use infrastructure::{
    agents::{ContextEvaluatorAgent, GeneratorAgent, KnowledgeRetrieverAgent, WebSearchAgent},
    corpus::FileCorpusBuilder,
    embedding::OpenAiEmbeddingProvider,
    llm::{HttpClient, OpenAiProvider},
    services::{CorpusService, QuestionService},
    web_search::DuckDuckGoProvider,
    Orchestrator,
};

/// Create the application state with all services initialized
///
/// Builds the corpus up front; a corpus that cannot be loaded aborts startup.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    config.validate()?;

    let corpus_builder = create_corpus_builder(config)?;
    let corpus = corpus_builder
        .build()
        .await
        .with_context(|| format!("Failed to build corpus from {}", config.corpus.data_path.display()))?;
    let handle = CorpusHandle::new(corpus);

    info!(passages = handle.passage_count(), "Corpus ready");

    let orchestrator = create_orchestrator(config, handle.clone())?;

    Ok(AppState::new(
        Arc::new(QuestionService::new(Arc::new(orchestrator))),
        Arc::new(CorpusService::new(handle, corpus_builder)),
    ))
}

fn create_corpus_builder(config: &AppConfig) -> anyhow::Result<Arc<dyn CorpusBuilder>> {
    let embedding = &config.embedding;
    let client = HttpClient::with_timeout(embedding.timeout())?;
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(
        OpenAiEmbeddingProvider::with_base_url(client, embedding.api_key()?, &embedding.base_url)
            .with_model(&embedding.model),
    );

    Ok(Arc::new(FileCorpusBuilder::new(
        &config.corpus.data_path,
        embedder,
        &embedding.model,
    )))
}

fn create_orchestrator(config: &AppConfig, corpus: CorpusHandle) -> anyhow::Result<Orchestrator> {
    let engine = &config.engine;

    let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::with_base_url(
        HttpClient::with_timeout(config.llm.timeout())?,
        config.llm.api_key()?,
        &config.llm.base_url,
    ));

    let web: Arc<dyn WebSearchProvider> = Arc::new(
        DuckDuckGoProvider::new(HttpClient::with_timeout(engine.retrieval.web_timeout())?)
            .with_urls(&config.web_search.api_url, &config.web_search.html_url)
            .with_priority_domains(config.web_search.priority_domains.clone()),
    );

    let orchestrator = Orchestrator::new(
        Arc::new(KnowledgeRetrieverAgent::new(
            corpus,
            &engine.scoring,
            &engine.retrieval,
        )),
        Arc::new(WebSearchAgent::new(web, &engine.scoring, &engine.retrieval)),
        Arc::new(ContextEvaluatorAgent::new(
            Arc::clone(&llm),
            &config.llm.model,
            engine.evaluation.clone(),
        )),
        Arc::new(GeneratorAgent::new(
            llm,
            &config.llm.model,
            engine.generation.clone(),
        )),
        engine,
    )?;

    Ok(orchestrator)
}
