//! Flat exact-scan vector index.

use serde::{Deserialize, Serialize};

use crate::error::{KnowledgeError, Result};

/// A search hit: positional row plus squared-L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub row: usize,
    pub distance: f32,
}

/// Exact nearest-neighbour index over contiguous fixed-dimension vectors.
///
/// Rows are positional: `add` returns the count before insertion, and
/// `remove` shifts every later row down by one. Anything keyed by row must
/// apply the same shift in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append a vector, returning its row (the count before insertion).
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dimension {
            return Err(KnowledgeError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        let row = self.len();
        self.data.extend_from_slice(vector);
        Ok(row)
    }

    /// Up to `k` nearest rows by squared Euclidean distance, ascending.
    /// Ties keep insertion order (lower row first).
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
        if query.len() != self.dimension {
            return Err(KnowledgeError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        let mut hits: Vec<Hit> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, stored)| Hit {
                row,
                distance: squared_l2(stored, query),
            })
            .collect();
        // Stable sort: equal distances stay in scan order.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    /// Remove the vector at `row`. Every later row shifts down by one.
    pub fn remove(&mut self, row: usize) -> Result<()> {
        let rows = self.len();
        if row >= rows {
            return Err(KnowledgeError::RowOutOfBounds { row, rows });
        }
        let start = row * self.dimension;
        self.data.drain(start..start + self.dimension);
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(vectors: &[&[f32]]) -> FlatIndex {
        let mut index = FlatIndex::new(vectors[0].len());
        for v in vectors {
            index.add(v).unwrap();
        }
        index
    }

    #[test]
    fn add_returns_count_before_insertion() {
        let mut index = FlatIndex::new(2);
        assert_eq!(index.add(&[0.0, 0.0]).unwrap(), 0);
        assert_eq!(index.add(&[1.0, 0.0]).unwrap(), 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn add_rejects_wrong_dimension() {
        let mut index = FlatIndex::new(3);
        let err = index.add(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn search_orders_by_ascending_distance() {
        let index = index_with(&[&[10.0, 0.0], &[1.0, 0.0], &[5.0, 0.0]]);
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let rows: Vec<usize> = hits.iter().map(|h| h.row).collect();
        assert_eq!(rows, vec![1, 2, 0]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn search_breaks_ties_by_insertion_order() {
        let index = index_with(&[&[1.0, 0.0], &[-1.0, 0.0], &[0.0, 1.0]]);
        // All three are at distance 1 from the origin.
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let rows: Vec<usize> = hits.iter().map(|h| h.row).collect();
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn search_caps_results_at_k() {
        let index = index_with(&[&[1.0], &[2.0], &[3.0], &[4.0]]);
        assert_eq!(index.search(&[0.0], 2).unwrap().len(), 2);
        assert_eq!(index.search(&[0.0], 10).unwrap().len(), 4);
        assert!(index.search(&[0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn search_on_empty_index_returns_nothing() {
        let index = FlatIndex::new(4);
        assert!(index.search(&[0.0; 4], 5).unwrap().is_empty());
    }

    #[test]
    fn remove_shifts_later_rows_down() {
        let mut index = index_with(&[&[1.0], &[2.0], &[3.0]]);
        index.remove(0).unwrap();
        assert_eq!(index.len(), 2);
        // The vector formerly at row 1 is now the nearest to 2.0 at row 0.
        let hits = index.search(&[2.0], 1).unwrap();
        assert_eq!(hits[0].row, 0);
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn remove_out_of_bounds_is_an_error() {
        let mut index = index_with(&[&[1.0]]);
        let err = index.remove(1).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::RowOutOfBounds { row: 1, rows: 1 }
        ));
    }

    #[test]
    fn serde_round_trip_preserves_search_results() {
        let index = index_with(&[&[0.25, -1.5], &[3.75, 0.125], &[-2.0, 2.0]]);
        let blob = serde_json::to_vec(&index).unwrap();
        let restored: FlatIndex = serde_json::from_slice(&blob).unwrap();
        assert_eq!(restored.dimension(), 2);
        assert_eq!(restored.len(), 3);
        let a = index.search(&[0.0, 0.0], 3).unwrap();
        let b = restored.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(a, b);
    }
}
