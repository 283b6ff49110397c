//! Exact flat index under squared Euclidean distance
//!
//! Vectors live in one contiguous buffer; search is a brute-force scan.
//! Ids are insertion ranks and never change. Nothing is persisted.

use std::cmp::Ordering;
use std::ops::Range;

use crate::error::{EmbedSearchError, Result};
use crate::similarity::squared_l2;

/// A search hit: positional id and squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    pub distance: f32,
}

/// Brute-force L2 index
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Create an empty index for vectors of `dimension`
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(EmbedSearchError::invalid("index dimension must be positive"));
        }
        Ok(Self {
            dimension,
            data: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append vectors, returning the ids they were assigned
    ///
    /// The whole batch is rejected if any vector has the wrong dimension.
    pub fn add<V: AsRef<[f32]>>(&mut self, vectors: &[V]) -> Result<Range<usize>> {
        if let Some(bad) = vectors
            .iter()
            .map(|v| v.as_ref().len())
            .find(|&len| len != self.dimension)
        {
            return Err(EmbedSearchError::dimension(self.dimension, bad));
        }

        let start = self.len();
        self.data.reserve(vectors.len() * self.dimension);
        for v in vectors {
            self.data.extend_from_slice(v.as_ref());
        }

        log::debug!("Added {} vectors (total {})", vectors.len(), self.len());
        Ok(start..self.len())
    }

    /// Return the stored vector for `id`
    pub fn reconstruct(&self, id: usize) -> Option<&[f32]> {
        let start = id.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.data.get(start..end)
    }

    /// The `k` nearest vectors to `query`, ascending by distance
    ///
    /// Returns every stored vector when `k` exceeds the index size.
    /// Equal distances are ordered by id.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(EmbedSearchError::dimension(self.dimension, query.len()));
        }

        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, v)| Neighbor {
                id,
                distance: squared_l2(query, v),
            })
            .collect();

        let k = k.min(hits.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let by_distance = |a: &Neighbor, b: &Neighbor| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        };

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, by_distance);
            hits.truncate(k);
        }
        hits.sort_by(by_distance);
        Ok(hits)
    }
}
