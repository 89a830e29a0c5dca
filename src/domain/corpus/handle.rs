use std::fmt;
use std::sync::{Arc, RwLock};

use super::Corpus;

/// Shared, swappable, read-only corpus snapshot
///
/// Runs take a snapshot with [`CorpusHandle::current`] and keep using it even
/// if a rebuild swaps in a new corpus mid-run.
#[derive(Clone)]
pub struct CorpusHandle {
    inner: Arc<RwLock<Arc<dyn Corpus>>>,
}

impl CorpusHandle {
    pub fn new(corpus: Arc<dyn Corpus>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(corpus)),
        }
    }

    pub fn current(&self) -> Arc<dyn Corpus> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Install a freshly built corpus, returning the previous snapshot
    pub fn swap(&self, corpus: Arc<dyn Corpus>) -> Arc<dyn Corpus> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, corpus)
    }

    pub fn passage_count(&self) -> usize {
        self.current().passage_count()
    }
}

impl fmt::Debug for CorpusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorpusHandle")
            .field("passages", &self.passage_count())
            .finish()
    }
}
