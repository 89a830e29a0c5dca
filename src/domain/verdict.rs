//! Sufficiency verdict types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of judging whether evidence answers a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sufficiency {
    /// Evidence fully answers the query
    Sufficient,
    /// Evidence does not answer the query
    Insufficient,
    /// Judgment could not be made reliably
    Ambiguous,
}

impl Sufficiency {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, Self::Sufficient)
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Self::Insufficient)
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sufficient => "sufficient",
            Self::Insufficient => "insufficient",
            Self::Ambiguous => "ambiguous",
        }
    }

    /// Parse a label produced by the judgment model, tolerating case and padding
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "sufficient" => Some(Self::Sufficient),
            "insufficient" => Some(Self::Insufficient),
            "ambiguous" => Some(Self::Ambiguous),
            _ => None,
        }
    }
}

impl fmt::Display for Sufficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict with rationale and confidence in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SufficiencyVerdict {
    pub sufficiency: Sufficiency,
    pub rationale: String,
    pub confidence: f64,
}

impl SufficiencyVerdict {
    /// Confidence is clamped into [0, 1]; NaN becomes 0
    pub fn new(sufficiency: Sufficiency, rationale: impl Into<String>, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            sufficiency,
            rationale: rationale.into(),
            confidence,
        }
    }

    pub fn sufficient(rationale: impl Into<String>, confidence: f64) -> Self {
        Self::new(Sufficiency::Sufficient, rationale, confidence)
    }

    pub fn insufficient(rationale: impl Into<String>, confidence: f64) -> Self {
        Self::new(Sufficiency::Insufficient, rationale, confidence)
    }

    pub fn ambiguous(rationale: impl Into<String>) -> Self {
        Self::new(Sufficiency::Ambiguous, rationale, 0.0)
    }

    pub fn is_sufficient(&self) -> bool {
        self.sufficiency.is_sufficient()
    }

    pub fn is_insufficient(&self) -> bool {
        self.sufficiency.is_insufficient()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.sufficiency.is_ambiguous()
    }
}
