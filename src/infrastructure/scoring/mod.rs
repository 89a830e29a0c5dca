//! Score fusion for hybrid retrieval

mod hybrid;

pub use hybrid::{min_max_normalize, FusedCandidate, HybridScorer};
