//! In-memory vector index over a persisted JSONL file.
//!
//! Loading validates that every record has the same dimension and
//! normalizes each vector to unit L2 norm once, so a query is a single
//! dot product per record.
//!
//! # Top-K Selection
//!
//! `retrieve` scores the whole corpus, partitions out the `k` best with
//! `select_nth_unstable_by` (O(N)), and sorts only those `k` (O(k log k)).
//! The comparator orders by score descending and then by corpus position,
//! so ties always resolve to the earlier record.

use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{EmbeddingRecord, QueryResult};
use crate::store;

/// Loaded, normalized, read-only embedding index.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    records: Vec<EmbeddingRecord>,
    dims: usize,
}

impl VectorIndex {
    /// Load a JSONL index file.
    pub fn load(path: &Path) -> Result<Self> {
        let records = store::read_records(path)?;
        debug!(records = records.len(), path = %path.display(), "loaded index");
        Self::from_records(records)
    }

    /// Build an index from records, validating dimensions and normalizing
    /// every vector in place.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if any record's dimension differs from the
    /// first record's.
    pub fn from_records(mut records: Vec<EmbeddingRecord>) -> Result<Self> {
        let dims = records.first().map(|r| r.embedding.len()).unwrap_or(0);

        if let Some(bad) = records.iter().find(|r| r.embedding.len() != dims) {
            return Err(Error::SchemaMismatch {
                context: format!("record {}", bad.id),
                expected: dims,
                actual: bad.embedding.len(),
            });
        }

        for record in &mut records {
            normalize(&mut record.embedding);
        }

        Ok(Self { records, dims })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vector dimension shared by every record (0 for an empty index).
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    /// Return up to `k` records most similar to `query`, best first.
    ///
    /// `k` is clamped to the corpus size; `k <= 0` or an empty index
    /// returns nothing. A zero query vector scores 0 against everything.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if `query` has a different dimension than
    /// the index.
    pub fn retrieve(&self, query: &[f32], k: i64) -> Result<Vec<QueryResult<'_>>> {
        if k <= 0 || self.records.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dims {
            return Err(Error::SchemaMismatch {
                context: "query vector".to_string(),
                expected: self.dims,
                actual: query.len(),
            });
        }

        let mut q = query.to_vec();
        normalize(&mut q);

        let scores: Vec<f32> = self
            .records
            .iter()
            .map(|r| dot(&q, &r.embedding).clamp(-1.0, 1.0))
            .collect();

        let k = (k as usize).min(scores.len());
        let by_rank = |a: &usize, b: &usize| -> Ordering {
            scores[*b].total_cmp(&scores[*a]).then(a.cmp(b))
        };

        let mut order: Vec<usize> = (0..scores.len()).collect();
        if k < order.len() {
            order.select_nth_unstable_by(k - 1, by_rank);
            order.truncate(k);
        }
        order.sort_by(by_rank);

        Ok(order
            .into_iter()
            .map(|i| QueryResult {
                score: scores[i],
                record: &self.records[i],
            })
            .collect())
    }
}

/// Scale `v` to unit length; a zero vector is left as is.
fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldMetadata;

    fn record(id: &str, embedding: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            id: id.to_string(),
            name: id.replace("->", "."),
            kind: "TypeField".to_string(),
            metadata: FieldMetadata::default(),
            embedding,
        }
    }

    fn corpus() -> VectorIndex {
        VectorIndex::from_records(vec![
            record("A->x", vec![1.0, 0.0]),
            record("A->y", vec![0.0, 2.0]),
            record("B->z", vec![-3.0, 0.0]),
            record("B->w", vec![1.0, 1.0]),
            record("C->zero", vec![0.0, 0.0]),
        ])
        .unwrap()
    }

    fn ids(results: &[QueryResult<'_>]) -> Vec<String> {
        results.iter().map(|r| r.record.id.clone()).collect()
    }

    #[test]
    fn test_vectors_normalized_at_load() {
        let index = corpus();
        for r in index.records() {
            let norm: f32 = r.embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if r.id == "C->zero" {
                assert_eq!(norm, 0.0);
            } else {
                assert!((norm - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_retrieve_top_k_sorted() {
        let index = corpus();
        let results = index.retrieve(&[2.0, 0.0], 3).unwrap();
        assert_eq!(ids(&results), vec!["A->x", "B->w", "A->y"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_retrieve_scores_in_range_and_negative() {
        let index = corpus();
        let results = index.retrieve(&[1.0, 0.0], 5).unwrap();
        for r in &results {
            assert!(r.score >= -1.0 && r.score <= 1.0);
        }
        let last = results.last().unwrap();
        assert_eq!(last.record.id, "B->z");
        assert!((last.score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_retrieve_whole_corpus_and_clamp() {
        let index = corpus();
        assert_eq!(index.retrieve(&[0.3, 0.7], 5).unwrap().len(), 5);
        assert_eq!(index.retrieve(&[0.3, 0.7], 500).unwrap().len(), 5);
    }

    #[test]
    fn test_retrieve_zero_and_negative_k() {
        let index = corpus();
        assert!(index.retrieve(&[1.0, 0.0], 0).unwrap().is_empty());
        assert!(index.retrieve(&[1.0, 0.0], -4).unwrap().is_empty());
    }

    #[test]
    fn test_retrieve_empty_corpus() {
        let index = VectorIndex::from_records(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert!(index.retrieve(&[1.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_zero_query_ties_keep_corpus_order() {
        let index = corpus();
        let results = index.retrieve(&[0.0, 0.0], 5).unwrap();
        assert!(results.iter().all(|r| r.score == 0.0));
        assert_eq!(ids(&results), vec!["A->x", "A->y", "B->z", "B->w", "C->zero"]);
    }

    #[test]
    fn test_partial_selection_ties_stable() {
        let index = VectorIndex::from_records(vec![
            record("a", vec![1.0, 0.0]),
            record("b", vec![0.0, 1.0]),
            record("c", vec![1.0, 0.0]),
            record("d", vec![2.0, 0.0]),
        ])
        .unwrap();
        let results = index.retrieve(&[1.0, 0.0], 2).unwrap();
        assert_eq!(ids(&results), vec!["a", "c"]);
        let results = index.retrieve(&[1.0, 0.0], 3).unwrap();
        assert_eq!(ids(&results), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_inconsistent_dims_rejected() {
        let err = VectorIndex::from_records(vec![
            record("a", vec![1.0, 0.0]),
            record("b", vec![1.0, 0.0, 0.0]),
        ])
        .unwrap_err();
        match err {
            Error::SchemaMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_query_dims_mismatch() {
        let index = corpus();
        let err = index.retrieve(&[1.0, 0.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }
}
