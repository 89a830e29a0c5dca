//! Ranked, deduplicated evidence collection

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::item::{EvidenceItem, SourceId};

/// Ordered evidence, sorted descending by combined score, unique by source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceSet {
    items: Vec<EvidenceItem>,
}

impl EvidenceSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rank `items` (given in original document order) and keep the best `top_k`
    ///
    /// Ordering: combined score desc, then raw semantic score desc, then input
    /// order. When two items share a source, the better ranked one survives.
    pub fn ranked(mut items: Vec<EvidenceItem>, top_k: usize) -> Self {
        items.sort_by(compare_rank);

        let mut seen: HashSet<SourceId> = HashSet::with_capacity(items.len());
        items.retain(|item| seen.insert(item.source().clone()));
        items.truncate(top_k);

        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EvidenceItem> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&EvidenceItem> {
        self.items.get(index)
    }

    pub fn top(&self) -> Option<&EvidenceItem> {
        self.items.first()
    }

    /// Combined score of the best item, 0.0 when empty
    pub fn top_score(&self) -> f64 {
        self.top().map(|item| item.combined_score()).unwrap_or(0.0)
    }
}

impl<'a> IntoIterator for &'a EvidenceSet {
    type Item = &'a EvidenceItem;
    type IntoIter = std::slice::Iter<'a, EvidenceItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn compare_rank(a: &EvidenceItem, b: &EvidenceItem) -> Ordering {
    b.combined_score()
        .total_cmp(&a.combined_score())
        .then_with(|| b.semantic_score().total_cmp(&a.semantic_score()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::{EvidenceScores, Provenance};

    fn item(doc: &str, semantic: f64, combined: f64) -> EvidenceItem {
        EvidenceItem::new(
            SourceId::new(doc, 0),
            format!("content of {}", doc),
            Provenance::Local,
            EvidenceScores::new(semantic, 0.0, combined),
        )
    }

    #[test]
    fn test_ranked_sorts_descending() {
        let set = EvidenceSet::ranked(
            vec![item("a", 0.1, 0.2), item("b", 0.5, 0.9), item("c", 0.3, 0.5)],
            10,
        );

        let docs: Vec<_> = set.iter().map(|i| i.source().document.as_str()).collect();
        assert_eq!(docs, vec!["b", "c", "a"]);
        assert_eq!(set.top_score(), 0.9);
    }

    #[test]
    fn test_ranked_breaks_ties_by_semantic_then_order() {
        let set = EvidenceSet::ranked(
            vec![
                item("first", 0.4, 0.7),
                item("second", 0.4, 0.7),
                item("higher-semantic", 0.9, 0.7),
            ],
            10,
        );

        let docs: Vec<_> = set.iter().map(|i| i.source().document.as_str()).collect();
        assert_eq!(docs, vec!["higher-semantic", "first", "second"]);
    }

    #[test]
    fn test_ranked_dedups_keeping_best() {
        let set = EvidenceSet::ranked(vec![item("a", 0.1, 0.3), item("a", 0.2, 0.8)], 10);

        assert_eq!(set.len(), 1);
        assert_eq!(set.top_score(), 0.8);
    }

    #[test]
    fn test_ranked_truncates() {
        let items = (0..12)
            .map(|i| item(&format!("d{}", i), 0.0, i as f64 / 12.0))
            .collect();
        let set = EvidenceSet::ranked(items, 8);

        assert_eq!(set.len(), 8);
        assert_eq!(set.top().unwrap().source().document, "d11");
    }

    #[test]
    fn test_empty_set() {
        let set = EvidenceSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.top_score(), 0.0);
        assert!(set.top().is_none());
    }
}
