//! Corpus service - readiness and atomic reloads of the live corpus

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{CorpusBuilder, CorpusHandle, DomainError};

/// Result of a completed reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub passages: usize,
    pub previous_passages: usize,
    pub duration: Duration,
    pub reloaded_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CorpusService {
    handle: CorpusHandle,
    builder: Arc<dyn CorpusBuilder>,
    reload_lock: Mutex<()>,
}

impl CorpusService {
    pub fn new(handle: CorpusHandle, builder: Arc<dyn CorpusBuilder>) -> Self {
        Self {
            handle,
            builder,
            reload_lock: Mutex::new(()),
        }
    }

    pub fn handle(&self) -> &CorpusHandle {
        &self.handle
    }

    pub fn passage_count(&self) -> usize {
        self.handle.passage_count()
    }

    /// Rebuild from source and swap the result in
    ///
    /// Runs already in flight keep their snapshot. A failed build leaves the
    /// live corpus untouched. Concurrent reloads are serialized.
    pub async fn reload(&self) -> Result<ReloadOutcome, DomainError> {
        let _guard = self.reload_lock.lock().await;
        let started = Instant::now();

        let corpus = self.builder.build().await?;
        let passages = corpus.passage_count();
        let previous = self.handle.swap(corpus);

        let outcome = ReloadOutcome {
            passages,
            previous_passages: previous.passage_count(),
            duration: started.elapsed(),
            reloaded_at: Utc::now(),
        };

        info!(
            passages = outcome.passages,
            previous_passages = outcome.previous_passages,
            duration_ms = outcome.duration.as_millis() as u64,
            "Corpus reloaded"
        );

        Ok(outcome)
    }
}
