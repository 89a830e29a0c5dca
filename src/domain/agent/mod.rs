//! Agent capability interface
//!
//! The engine has a fixed set of agents. Each one receives the query plus a
//! read-only view of the accumulated evidence and returns a new value; none of
//! them mutates state shared with another agent.

mod error;

pub use error::AgentError;

use std::borrow::Cow;
use std::fmt;

use async_trait::async_trait;

use super::evidence::EvidenceSet;
use super::query::Query;
use super::response::{AgentResponse, Degradation};
use super::verdict::SufficiencyVerdict;

/// The closed set of agents the orchestrator dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    KnowledgeRetriever,
    WebSearch,
    ContextEvaluator,
    Generator,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowledgeRetriever => "knowledge_retriever",
            Self::WebSearch => "web_search",
            Self::ContextEvaluator => "context_evaluator",
            Self::Generator => "generator",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to a single agent invocation
#[derive(Debug, Clone, Copy)]
pub struct AgentRequest<'a> {
    pub query: &'a Query,
    pub evidence: Option<&'a EvidenceSet>,
    /// Generator only: the verdict the evidence was judged with
    pub verdict: Option<&'a SufficiencyVerdict>,
    /// Generator only: answer despite weak evidence, acknowledging uncertainty
    pub hedge: bool,
}

impl<'a> AgentRequest<'a> {
    pub fn new(query: &'a Query) -> Self {
        Self {
            query,
            evidence: None,
            verdict: None,
            hedge: false,
        }
    }

    pub fn with_evidence(mut self, evidence: &'a EvidenceSet) -> Self {
        self.evidence = Some(evidence);
        self
    }

    pub fn with_verdict(mut self, verdict: &'a SufficiencyVerdict) -> Self {
        self.verdict = Some(verdict);
        self
    }

    pub fn with_hedge(mut self, hedge: bool) -> Self {
        self.hedge = hedge;
        self
    }

    /// Evidence view, empty when none was supplied
    pub fn evidence_or_empty(&self) -> Cow<'a, EvidenceSet> {
        match self.evidence {
            Some(evidence) => Cow::Borrowed(evidence),
            None => Cow::Owned(EvidenceSet::empty()),
        }
    }
}

/// What an agent produced
#[derive(Debug, Clone)]
pub enum AgentOutcome {
    Evidence(EvidenceSet),
    Verdict(SufficiencyVerdict),
    Response(AgentResponse),
}

impl AgentOutcome {
    fn kind(&self) -> &'static str {
        match self {
            Self::Evidence(_) => "evidence",
            Self::Verdict(_) => "verdict",
            Self::Response(_) => "response",
        }
    }
}

/// Outcome plus any non-fatal degradations encountered while producing it
#[derive(Debug, Clone)]
pub struct AgentResult {
    pub outcome: AgentOutcome,
    pub degradations: Vec<Degradation>,
}

impl AgentResult {
    pub fn new(outcome: AgentOutcome) -> Self {
        Self {
            outcome,
            degradations: Vec::new(),
        }
    }

    pub fn evidence(evidence: EvidenceSet) -> Self {
        Self::new(AgentOutcome::Evidence(evidence))
    }

    pub fn verdict(verdict: SufficiencyVerdict) -> Self {
        Self::new(AgentOutcome::Verdict(verdict))
    }

    pub fn response(response: AgentResponse) -> Self {
        Self::new(AgentOutcome::Response(response))
    }

    pub fn with_degradation(mut self, degradation: Degradation) -> Self {
        self.degradations.push(degradation);
        self
    }

    pub fn into_evidence(self) -> Result<(EvidenceSet, Vec<Degradation>), AgentError> {
        match self.outcome {
            AgentOutcome::Evidence(evidence) => Ok((evidence, self.degradations)),
            other => Err(AgentError::unexpected("evidence", other.kind())),
        }
    }

    pub fn into_verdict(self) -> Result<(SufficiencyVerdict, Vec<Degradation>), AgentError> {
        match self.outcome {
            AgentOutcome::Verdict(verdict) => Ok((verdict, self.degradations)),
            other => Err(AgentError::unexpected("verdict", other.kind())),
        }
    }

    pub fn into_response(self) -> Result<(AgentResponse, Vec<Degradation>), AgentError> {
        match self.outcome {
            AgentOutcome::Response(response) => Ok((response, self.degradations)),
            other => Err(AgentError::unexpected("response", other.kind())),
        }
    }
}

/// One capability interface shared by every agent
#[async_trait]
pub trait Agent: Send + Sync {
    fn role(&self) -> AgentRole;

    async fn process(&self, request: AgentRequest<'_>) -> Result<AgentResult, AgentError>;
}
