//! Evidence domain
//!
//! Retrieved passages and web snippets share one shape so that local and web
//! evidence can be merged and ranked together.

mod item;
mod set;

pub use item::{EvidenceItem, EvidenceScores, Provenance, SourceId};
pub use set::EvidenceSet;
