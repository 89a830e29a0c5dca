//! Dense vector index with cosine similarity search

use crate::domain::embedding::l2_normalize;

/// Unit-length vectors searched by inner product
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl VectorIndex {
    /// Build from raw embeddings; vectors are normalized on the way in
    ///
    /// Vectors whose length differs from the first one are stored as zero
    /// vectors and never match.
    pub fn new(vectors: Vec<Vec<f32>>) -> Self {
        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        let vectors = vectors
            .into_iter()
            .map(|mut vector| {
                if vector.len() != dimensions {
                    return vec![0.0; dimensions];
                }
                l2_normalize(&mut vector);
                vector
            })
            .collect();

        Self {
            vectors,
            dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Top `k` entries by cosine similarity, best first
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f64)> {
        if self.is_empty() || query.len() != self.dimensions {
            return Vec::new();
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| {
                let dot: f32 = vector.iter().zip(&query).map(|(a, b)| a * b).sum();
                (index, dot as f64)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}
