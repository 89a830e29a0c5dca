//! Orchestration state machine types

mod cancellation;
mod state;

pub use cancellation::{CancellationToken, DropGuard};
pub use state::{FailureKind, OrchestrationState, Phase};
