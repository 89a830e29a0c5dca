//! Query value type and request identifiers

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonically increasing request identifier used to correlate logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q-{}", self.0)
    }
}

/// Hands out request identifiers; shared by every run of one engine
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `last`
    pub fn starting_after(last: u64) -> Self {
        Self {
            next: AtomicU64::new(last),
        }
    }

    pub fn next_id(&self) -> RequestId {
        RequestId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Routing hint supplied by the caller
///
/// Routing currently has a single path (local retrieval first); the hint is
/// recorded and logged so that query classification can be added later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingHint {
    #[default]
    LocalFirst,
    PreferFresh,
}

/// An immutable user question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    id: RequestId,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    routing_hint: Option<RoutingHint>,
}

impl Query {
    pub fn new(id: RequestId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            routing_hint: None,
        }
    }

    pub fn with_routing_hint(mut self, hint: RoutingHint) -> Self {
        self.routing_hint = Some(hint);
        self
    }

    /// Same request, different wording (used for web search reformulation)
    pub fn reformulated(&self, text: impl Into<String>) -> Self {
        Self {
            id: self.id,
            text: text.into(),
            routing_hint: self.routing_hint,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn routing_hint(&self) -> Option<RoutingHint> {
        self.routing_hint
    }
}
