//! Hybrid scorer
//!
//! Fuses a semantic ranking and a keyword ranking into one ordered candidate
//! list. Each ranking is min-max scaled to [0, 1] over its own candidates, then
//! combined as `w_sem * sem + w_kw * kw`. A candidate missing from one ranking
//! gets zero from that signal, so a ranking that is empty as a whole leaves
//! only the weighted term of the other one.

use std::collections::HashMap;

use crate::domain::corpus::ScoredCandidate;
use crate::domain::engine_config::ScoringConfig;
use crate::domain::evidence::{EvidenceScores, EvidenceSet, SourceId};

/// A candidate after fusion, before its content is fetched
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    pub id: SourceId,
    /// Raw semantic score, `None` when absent from the semantic ranking
    pub semantic: Option<f64>,
    /// Raw keyword score, `None` when absent from the keyword ranking
    pub keyword: Option<f64>,
    pub combined: f64,
}

impl FusedCandidate {
    pub fn scores(&self) -> EvidenceScores {
        EvidenceScores::new(
            self.semantic.unwrap_or(0.0),
            self.keyword.unwrap_or(0.0),
            self.combined,
        )
    }
}

#[derive(Debug, Clone)]
pub struct HybridScorer {
    semantic_weight: f64,
    keyword_weight: f64,
    top_k: usize,
}

impl HybridScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            semantic_weight: config.semantic_weight,
            keyword_weight: config.keyword_weight,
            top_k: config.top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Fuse two rankings into at most `top_k` candidates, best first
    ///
    /// Ties on the combined score go to the higher raw semantic score, then
    /// to first appearance (semantic ranking before keyword ranking).
    pub fn fuse(
        &self,
        semantic: &[ScoredCandidate],
        keyword: &[ScoredCandidate],
    ) -> Vec<FusedCandidate> {
        let semantic = dedup_ranking(semantic);
        let keyword = dedup_ranking(keyword);

        if semantic.is_empty() && keyword.is_empty() {
            return Vec::new();
        }

        let semantic_norm = min_max_normalize(&semantic.iter().map(|c| c.1).collect::<Vec<_>>());
        let keyword_norm = min_max_normalize(&keyword.iter().map(|c| c.1).collect::<Vec<_>>());

        let mut candidates: Vec<FusedCandidate> = Vec::with_capacity(semantic.len() + keyword.len());
        let mut positions: HashMap<SourceId, usize> = HashMap::new();

        for ((id, raw), norm) in semantic.into_iter().zip(semantic_norm) {
            positions.insert(id.clone(), candidates.len());
            candidates.push(FusedCandidate {
                id,
                semantic: Some(raw),
                keyword: None,
                combined: self.semantic_weight * norm,
            });
        }

        for ((id, raw), norm) in keyword.into_iter().zip(keyword_norm) {
            let contribution = self.keyword_weight * norm;
            match positions.get(&id) {
                Some(&index) => {
                    let candidate = &mut candidates[index];
                    candidate.keyword = Some(raw);
                    candidate.combined += contribution;
                }
                None => {
                    positions.insert(id.clone(), candidates.len());
                    candidates.push(FusedCandidate {
                        id,
                        semantic: None,
                        keyword: Some(raw),
                        combined: contribution,
                    });
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.combined.total_cmp(&a.combined).then_with(|| {
                b.semantic
                    .unwrap_or(0.0)
                    .total_cmp(&a.semantic.unwrap_or(0.0))
            })
        });
        candidates.truncate(self.top_k);
        candidates
    }

    /// Union of two evidence sets, re-sorted and re-truncated
    pub fn merge(&self, accumulated: &EvidenceSet, incoming: &EvidenceSet) -> EvidenceSet {
        let items = accumulated
            .iter()
            .chain(incoming.iter())
            .cloned()
            .collect();
        EvidenceSet::ranked(items, self.top_k)
    }
}

/// Min-max scale `scores` into [0, 1]
///
/// Non-finite scores count as 0. When every score is equal the range is
/// degenerate and every score maps to 0.0.
pub fn min_max_normalize(scores: &[f64]) -> Vec<f64> {
    let scores: Vec<f64> = scores
        .iter()
        .map(|s| if s.is_finite() { *s } else { 0.0 })
        .collect();

    let Some(min) = scores.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = scores.iter().copied().fold(min, f64::max);
    let range = max - min;

    if range <= f64::EPSILON {
        return vec![0.0; scores.len()];
    }

    scores.iter().map(|s| (s - min) / range).collect()
}

/// Keep the first position of each id with its best raw score
fn dedup_ranking(ranking: &[ScoredCandidate]) -> Vec<(SourceId, f64)> {
    let mut out: Vec<(SourceId, f64)> = Vec::with_capacity(ranking.len());
    let mut positions: HashMap<&SourceId, usize> = HashMap::with_capacity(ranking.len());

    for candidate in ranking {
        match positions.get(&candidate.id) {
            Some(&index) => {
                if candidate.score > out[index].1 {
                    out[index].1 = candidate.score;
                }
            }
            None => {
                positions.insert(&candidate.id, out.len());
                out.push((candidate.id.clone(), candidate.score));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::{EvidenceItem, Provenance};
    use std::collections::HashSet;

    fn candidate(doc: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate::new(SourceId::new(doc, 0), score)
    }

    fn scorer() -> HybridScorer {
        HybridScorer::new(&ScoringConfig::default())
    }

    fn docs(fused: &[FusedCandidate]) -> Vec<&str> {
        fused.iter().map(|c| c.id.document.as_str()).collect()
    }

    #[test]
    fn test_min_max_normalize() {
        assert_eq!(min_max_normalize(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn test_min_max_degenerate_range() {
        assert_eq!(min_max_normalize(&[0.7, 0.7]), vec![0.0, 0.0]);
        assert_eq!(min_max_normalize(&[0.7]), vec![0.0]);
        assert_eq!(min_max_normalize(&[0.0]), vec![0.0]);
        assert_eq!(min_max_normalize(&[f64::NAN, 2.0]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_fuse_applies_weights() {
        let fused = scorer().fuse(
            &[candidate("a", 0.9), candidate("b", 0.5)],
            &[candidate("b", 10.0), candidate("c", 2.0)],
        );

        assert_eq!(docs(&fused), vec!["a", "b", "c"]);
        assert!((fused[0].combined - 0.6).abs() < 1e-9);
        assert!((fused[1].combined - 0.4).abs() < 1e-9);
        assert_eq!(fused[2].combined, 0.0);
        assert_eq!(fused[2].semantic, None);
        assert_eq!(fused[1].keyword, Some(10.0));
    }

    #[test]
    fn test_fuse_output_sorted_and_unique() {
        let fused = scorer().fuse(
            &[
                candidate("a", 0.2),
                candidate("b", 0.8),
                candidate("c", 0.5),
                candidate("b", 0.1),
            ],
            &[candidate("c", 5.0), candidate("a", 1.0), candidate("d", 3.0)],
        );

        for pair in fused.windows(2) {
            assert!(pair[0].combined >= pair[1].combined);
        }
        let unique: HashSet<_> = fused.iter().map(|c| c.id.clone()).collect();
        assert_eq!(unique.len(), fused.len());
    }

    #[test]
    fn test_both_empty_gives_empty() {
        assert!(scorer().fuse(&[], &[]).is_empty());
    }

    #[test]
    fn test_single_ranking_keeps_its_own_weight() {
        let fused = scorer().fuse(&[], &[candidate("a", 4.0), candidate("b", 2.0)]);

        assert_eq!(docs(&fused), vec!["a", "b"]);
        assert!((fused[0].combined - 0.4).abs() < 1e-9);
        assert_eq!(fused[1].combined, 0.0);

        let fused = scorer().fuse(&[candidate("x", 0.9), candidate("y", 0.3)], &[]);
        assert!((fused[0].combined - 0.6).abs() < 1e-9);

        let fused = scorer().fuse(&[candidate("only", 0.3)], &[]);
        assert_eq!(fused[0].combined, 0.0);
    }

    #[test]
    fn test_ties_prefer_semantic_then_first_appearance() {
        let fused = scorer().fuse(
            &[candidate("a", 0.5), candidate("b", 0.5)],
            &[candidate("b", 1.0), candidate("a", 1.0)],
        );
        assert_eq!(docs(&fused), vec!["a", "b"]);

        let fused = scorer().fuse(&[candidate("low", 0.2), candidate("high", 0.2)], &[]);
        assert_eq!(docs(&fused), vec!["low", "high"]);
    }

    #[test]
    fn test_fuse_truncates_to_top_k() {
        let semantic: Vec<_> = (0..20)
            .map(|i| candidate(&format!("d{}", i), i as f64))
            .collect();
        let fused = scorer().fuse(&semantic, &[]);

        assert_eq!(fused.len(), 8);
        assert_eq!(fused[0].id.document, "d19");
    }

    #[test]
    fn test_merge_unions_and_reranks() {
        let item = |doc: &str, combined: f64, provenance| {
            EvidenceItem::new(
                SourceId::new(doc, 0),
                doc,
                provenance,
                EvidenceScores::new(0.0, 0.0, combined),
            )
        };
        let local = EvidenceSet::ranked(
            vec![item("l1", 0.4, Provenance::Local), item("shared", 0.3, Provenance::Local)],
            8,
        );
        let web = EvidenceSet::ranked(
            vec![item("w1", 0.9, Provenance::Web), item("shared", 0.6, Provenance::Web)],
            8,
        );

        let merged = scorer().merge(&local, &web);

        let order: Vec<_> = merged.iter().map(|i| i.source().document.as_str()).collect();
        assert_eq!(order, vec!["w1", "shared", "l1"]);
        assert_eq!(merged.get(1).unwrap().provenance(), Provenance::Web);
    }
}
