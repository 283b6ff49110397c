//! Embedding module for semantic search
//!
//! An [`Embedder`] maps ordered texts to ordered fixed-dimension vectors.
//! [`FastEmbedder`] runs a pre-trained sentence model through fastembed;
//! [`BagOfWordsEmbedder`] is a deterministic offline stand-in.

mod bag_of_words;
mod discovery;
mod engine;
mod sentence;

pub use bag_of_words::BagOfWordsEmbedder;
pub use discovery::find_model_cache_dir;
pub use engine::VectorEngine;
pub use sentence::{FastEmbedConfig, FastEmbedder, SentenceModel};

use crate::error::{EmbedSearchError, Result};

/// Text to vector encoder
///
/// Implementations must be deterministic for a fixed model and input, and
/// must return exactly one vector of [`Embedder::dimension`] per input text,
/// in input order.
pub trait Embedder: Send + Sync {
    /// Human-readable model identifier
    fn model_name(&self) -> &str;

    /// Output vector dimension
    fn dimension(&self) -> usize;

    /// Embed a batch of texts
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbedSearchError::embedding("model returned no vector"))
    }
}

/// Check an embedder's output against the texts it was given
pub(crate) fn check_batch(
    texts: &[&str],
    vectors: &[Vec<f32>],
    dimension: usize,
) -> Result<()> {
    if vectors.len() != texts.len() {
        return Err(EmbedSearchError::embedding(format!(
            "expected {} vectors, model returned {}",
            texts.len(),
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(EmbedSearchError::dimension(dimension, bad.len()));
    }
    Ok(())
}
