use crate::error::{Result, VectorStoreError};
use ndarray::{ArrayView1, ArrayView2};
use std::cmp::Ordering;

/// Append-only flat index of fixed-dimension vectors, searched exhaustively.
///
/// Rows are stored row-major in one contiguous buffer; row order is
/// insertion order and is the only way to address an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Rebuild an index from a row-major buffer
    pub fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 {
            return Err(VectorStoreError::IndexError(
                "dimension must be > 0".to_string(),
            ));
        }
        if data.len() % dimension != 0 {
            return Err(VectorStoreError::IndexError(format!(
                "buffer of {} floats is not a multiple of dimension {dimension}",
                data.len()
            )));
        }
        Ok(Self { dimension, data })
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len().checked_div(self.dimension).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append one row
    pub fn push(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        let start = row.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Raw row-major buffer
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Keep only the first `rows` rows
    pub fn truncate(&mut self, rows: usize) {
        self.data.truncate(rows.saturating_mul(self.dimension));
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Exhaustive inner-product search.
    ///
    /// Returns `(row, score)` for the `min(k, len)` best rows, score
    /// descending, equal scores ordered by lower row first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let rows = self.len();
        if rows == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let matrix = ArrayView2::from_shape((rows, self.dimension), &self.data)
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;
        let scores = matrix.dot(&ArrayView1::from(query));

        let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        if k < ranked.len() {
            ranked.select_nth_unstable_by(k - 1, rank_order);
            ranked.truncate(k);
        }
        ranked.sort_unstable_by(rank_order);

        Ok(ranked)
    }
}

fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_and_search() {
        let mut index = VectorIndex::new(3);

        index.push(&[1.0, 0.0, 0.0]).unwrap();
        index.push(&[0.8, 0.6, 0.0]).unwrap();
        index.push(&[0.0, 1.0, 0.0]).unwrap();

        assert_eq!(index.len(), 3);

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-6);

        assert_eq!(results[1].0, 1);
        assert!((results[1].1 - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = VectorIndex::new(3);
        assert!(index.push(&[1.0, 0.0]).is_err());
        assert!(index.is_empty());

        index.push(&[1.0, 0.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let mut index = VectorIndex::new(2);
        for _ in 0..5 {
            index.push(&[0.0, 1.0]).unwrap();
        }
        index.push(&[1.0, 0.0]).unwrap();

        let results = index.search(&[0.0, 1.0], 3).unwrap();
        let rows: Vec<usize> = results.iter().map(|(row, _)| *row).collect();
        assert_eq!(rows, vec![0, 1, 2]);

        let all = index.search(&[0.0, 1.0], 100).unwrap();
        let rows: Vec<usize> = all.iter().map(|(row, _)| *row).collect();
        assert_eq!(rows, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn negative_scores_rank_last() {
        let mut index = VectorIndex::new(2);
        index.push(&[-1.0, 0.0]).unwrap();
        index.push(&[0.0, 1.0]).unwrap();
        index.push(&[1.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results[0].0, 2);
        assert_eq!(results[2].0, 0);
        assert!((results[2].1 + 1.0).abs() < 1e-6);
    }

    #[test]
    fn search_empty_or_zero_k() {
        let mut index = VectorIndex::new(2);
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
        index.push(&[1.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn truncate_and_rows() {
        let mut index = VectorIndex::new(2);
        index.push(&[1.0, 2.0]).unwrap();
        index.push(&[3.0, 4.0]).unwrap();
        assert_eq!(index.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(index.row(2), None);

        index.truncate(1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.as_slice(), &[1.0, 2.0]);

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 2);
    }

    #[test]
    fn matches_naive_dot_product_ranking() {
        let dimension = 7;
        let mut seed = 0x2545_f491_4f6c_dd1d_u64;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % 2001) as f32 / 1000.0 - 1.0
        };

        let mut index = VectorIndex::new(dimension);
        let mut rows = Vec::new();
        for _ in 0..40 {
            let row: Vec<f32> = (0..dimension).map(|_| next()).collect();
            index.push(&row).unwrap();
            rows.push(row);
        }
        let query: Vec<f32> = (0..dimension).map(|_| next()).collect();

        let naive: Vec<f32> = rows
            .iter()
            .map(|row| row.iter().zip(&query).map(|(a, b)| a * b).sum())
            .collect();
        let mut sorted = naive.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));

        let results = index.search(&query, 10).unwrap();
        assert_eq!(results.len(), 10);
        for (row, score) in &results {
            assert!((score - naive[*row]).abs() < 1e-5);
        }
        assert!(results.windows(2).all(|pair| pair[0].1 >= pair[1].1));
        // Nothing left out scores meaningfully higher than the last hit
        assert!(results[9].1 >= sorted[9] - 1e-5);
    }

    #[test]
    fn from_raw_validates_shape() {
        assert!(VectorIndex::from_raw(3, vec![0.0; 7]).is_err());
        assert!(VectorIndex::from_raw(0, vec![]).is_err());
        let index = VectorIndex::from_raw(3, vec![0.0; 9]).unwrap();
        assert_eq!(index.len(), 3);
    }
}
