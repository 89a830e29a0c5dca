//! Corpus domain
//!
//! Read-only access to the regulations corpus: two independent rankings plus
//! passage lookup, served from a snapshot that can be replaced atomically.

mod builder;
mod handle;
mod index;
mod passage;

pub use builder::CorpusBuilder;
pub use handle::CorpusHandle;
pub use index::{Corpus, CorpusIndex, DocumentStore, ScoredCandidate};
pub use passage::Passage;

#[cfg(test)]
pub use index::mock::MockCorpusIndex;
