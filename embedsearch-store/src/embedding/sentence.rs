//! fastembed sentence embeddings
//!
//! ONNX sentence-transformer models downloaded from HuggingFace on first use
//! and cached on disk.

use std::path::PathBuf;
use std::str::FromStr;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::discovery::find_model_cache_dir;
use super::{check_batch, Embedder};
use crate::error::{EmbedSearchError, Result};

/// Supported sentence models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentenceModel {
    /// sentence-transformers/all-MiniLM-L6-v2 (384 dimensions)
    #[default]
    AllMiniLmL6V2,
    /// BAAI/bge-small-en-v1.5 (384 dimensions)
    BgeSmallEnV15,
}

impl SentenceModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            Self::BgeSmallEnV15 => "bge-small-en-v1.5",
        }
    }

    fn to_fastembed(self) -> EmbeddingModel {
        match self {
            Self::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            Self::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
        }
    }
}

impl FromStr for SentenceModel {
    type Err = EmbedSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all-minilm-l6-v2" | "minilm" => Ok(Self::AllMiniLmL6V2),
            "bge-small-en-v1.5" | "bge-small" => Ok(Self::BgeSmallEnV15),
            other => Err(EmbedSearchError::invalid(format!(
                "unknown embedding model: {other}"
            ))),
        }
    }
}

/// fastembed configuration
#[derive(Debug, Clone)]
pub struct FastEmbedConfig {
    pub model: SentenceModel,
    /// Model cache directory; discovered when unset
    pub cache_dir: Option<PathBuf>,
    /// Maximum sequence length (default: 256)
    pub max_length: usize,
    /// Batch size for encoding (default: 256)
    pub batch_size: usize,
    pub show_download_progress: bool,
}

impl Default for FastEmbedConfig {
    fn default() -> Self {
        Self {
            model: SentenceModel::default(),
            cache_dir: None,
            max_length: 256,
            batch_size: 256,
            show_download_progress: false,
        }
    }
}

/// fastembed model wrapper
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    config: FastEmbedConfig,
    dimension: usize,
}

impl FastEmbedder {
    /// Load the default model (all-MiniLM-L6-v2)
    pub fn new() -> Result<Self> {
        Self::with_config(FastEmbedConfig::default())
    }

    /// Load a model with custom configuration
    ///
    /// Any failure here is a model-load error: missing weights, no network
    /// on first download, or a broken ONNX runtime.
    pub fn with_config(config: FastEmbedConfig) -> Result<Self> {
        let cache_dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => find_model_cache_dir(),
        };

        log::info!(
            "Loading {} (cache: {})",
            config.model.as_str(),
            cache_dir.display()
        );

        let options = InitOptions::new(config.model.to_fastembed())
            .with_cache_dir(cache_dir)
            .with_max_length(config.max_length)
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(options).map_err(|e| {
            EmbedSearchError::model(format!("Failed to load {}: {}", config.model.as_str(), e))
        })?;

        // Get dimension by encoding test string
        let probe = model
            .embed(vec!["test"], None)
            .map_err(|e| EmbedSearchError::model(format!("Failed to encode test string: {}", e)))?;
        let dimension = probe
            .first()
            .map(Vec::len)
            .ok_or_else(|| EmbedSearchError::model("model returned no probe vector"))?;

        log::info!(
            "Loaded {} ({}d, max {} tokens)",
            config.model.as_str(),
            dimension,
            config.max_length
        );

        Ok(Self {
            model: Mutex::new(model),
            config,
            dimension,
        })
    }

    pub fn config(&self) -> &FastEmbedConfig {
        &self.config
    }
}

impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        self.config.model.as_str()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let vectors = self
            .model
            .lock()
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e| EmbedSearchError::embedding(format!("Failed to encode texts: {}", e)))?;

        check_batch(texts, &vectors, self.dimension)?;
        Ok(vectors)
    }
}
