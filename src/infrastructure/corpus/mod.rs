//! In-memory regulations corpus

mod bm25;
mod file_builder;
mod in_memory;
mod loader;
mod text;
mod vector;

pub use bm25::Bm25Index;
pub use file_builder::FileCorpusBuilder;
pub use in_memory::InMemoryCorpus;
pub use loader::{load_passages, parse_passages};
pub use text::{normalize_text, tokenize};
pub use vector::VectorIndex;
