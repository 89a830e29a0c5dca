//! Loads scraped regulation passages from a JSON data file
//!
//! Two layouts are accepted: an array of `"header: text"` strings (as the
//! scraper writes them) or an array of `{source, content}` objects.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::text::normalize_text;
use crate::domain::corpus::Passage;
use crate::domain::evidence::SourceId;
use crate::domain::DomainError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Text(String),
    Record {
        #[serde(alias = "id")]
        source: String,
        content: String,
        #[serde(default)]
        chunk: Option<u32>,
        #[serde(default)]
        title: Option<String>,
    },
}

/// Read and parse a passage file
pub async fn load_passages(path: impl AsRef<Path>) -> Result<Vec<Passage>, DomainError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        DomainError::corpus(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let passages = parse_passages(&raw)?;
    info!(path = %path.display(), passages = passages.len(), "Loaded corpus data");
    Ok(passages)
}

/// Parse passage JSON; chunk offsets count repeated sources in file order
pub fn parse_passages(raw: &str) -> Result<Vec<Passage>, DomainError> {
    let entries: Vec<RawEntry> = serde_json::from_str(raw)
        .map_err(|e| DomainError::corpus(format!("Invalid corpus data: {}", e)))?;

    let mut next_chunk: HashMap<String, u32> = HashMap::new();
    let mut passages = Vec::with_capacity(entries.len());

    for (position, entry) in entries.into_iter().enumerate() {
        let (source, content, chunk, title) = match entry {
            RawEntry::Text(text) => {
                let text = normalize_text(&text);
                match text.split_once(':') {
                    Some((header, _)) if !header.trim().is_empty() => {
                        let header = header.trim().to_string();
                        (header.clone(), text, None, Some(header))
                    }
                    _ => (format!("passage-{}", position), text, None, None),
                }
            }
            RawEntry::Record {
                source,
                content,
                chunk,
                title,
            } => (source, normalize_text(&content), chunk, title),
        };

        if content.is_empty() {
            warn!(position, source = %source, "Skipping empty passage");
            continue;
        }

        let counter = next_chunk.entry(source.clone()).or_insert(0);
        let chunk = chunk.unwrap_or(*counter);
        *counter = (*counter).max(chunk + 1);

        let mut passage = Passage::new(SourceId::new(source, chunk), content);
        if let Some(title) = title {
            passage = passage.with_title(title);
        }
        passages.push(passage);
    }

    Ok(passages)
}
