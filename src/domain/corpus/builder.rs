use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use super::Corpus;
use crate::domain::DomainError;

/// Produces a fresh corpus snapshot from its backing data
///
/// Used at startup and whenever the corpus is reloaded; the result is
/// installed through [`super::CorpusHandle::swap`].
#[async_trait]
pub trait CorpusBuilder: Send + Sync + Debug {
    async fn build(&self) -> Result<Arc<dyn Corpus>, DomainError>;
}
