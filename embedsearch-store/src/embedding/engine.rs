//! Vector embedding engine
//!
//! High-level API for generating and caching embeddings.

use dashmap::DashMap;
use std::sync::Arc;

use super::{check_batch, Embedder, FastEmbedConfig, FastEmbedder};
use crate::error::Result;
use crate::similarity::cosine_similarity;

/// Vector embedding engine with caching
///
/// Wraps any [`Embedder`] with a DashMap cache so repeated texts are only
/// encoded once.
pub struct VectorEngine {
    model: Arc<dyn Embedder>,
    cache: DashMap<String, Vec<f32>>,
    dimension: usize,
}

impl VectorEngine {
    /// Create VectorEngine with the default fastembed model
    pub fn new() -> Result<Self> {
        Self::with_fastembed(FastEmbedConfig::default())
    }

    /// Create VectorEngine with a configured fastembed model
    pub fn with_fastembed(config: FastEmbedConfig) -> Result<Self> {
        let model = FastEmbedder::with_config(config)?;
        log::info!(
            "VectorEngine ready ({}, {}d)",
            model.model_name(),
            model.dimension()
        );
        Ok(Self::from_embedder(Arc::new(model)))
    }

    /// Create VectorEngine around an existing embedder
    pub fn from_embedder(model: Arc<dyn Embedder>) -> Self {
        let dimension = model.dimension();
        Self {
            model,
            cache: DashMap::new(),
            dimension,
        }
    }

    /// Batch embed with caching
    pub fn embed_cached(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        // Check cache for all texts
        let mut results: Vec<Option<Vec<f32>>> = texts
            .iter()
            .map(|text| self.cache.get(*text).map(|v| v.clone()))
            .collect();

        // Find uncached texts
        let uncached: Vec<(usize, &str)> = results
            .iter()
            .enumerate()
            .filter(|(_, cached)| cached.is_none())
            .map(|(i, _)| (i, texts[i]))
            .collect();

        if uncached.is_empty() {
            return Ok(results.into_iter().flatten().collect());
        }

        let uncached_texts: Vec<&str> = uncached.iter().map(|(_, t)| *t).collect();
        let new_embeddings = self.model.embed_batch(&uncached_texts)?;
        check_batch(&uncached_texts, &new_embeddings, self.dimension)?;

        for ((idx, text), emb) in uncached.iter().zip(new_embeddings.into_iter()) {
            self.cache.insert(text.to_string(), emb.clone());
            results[*idx] = Some(emb);
        }

        Ok(results.into_iter().flatten().collect())
    }

    /// Cosine similarity between two embeddings
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Embedder for VectorEngine {
    fn model_name(&self) -> &str {
        self.model.model_name()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.embed_cached(texts)
    }
}
