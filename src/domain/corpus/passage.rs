use serde::{Deserialize, Serialize};

use crate::domain::evidence::SourceId;

/// A chunk of regulation text addressable by source id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: SourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
}

impl Passage {
    pub fn new(id: SourceId, content: impl Into<String>) -> Self {
        Self {
            id,
            title: None,
            content: content.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
