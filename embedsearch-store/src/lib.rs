//! Embedsearch store
//!
//! Sentence embeddings plus two vector-index backends for nearest-neighbour
//! search over a small corpus.
//!
//! ## Features
//!
//! - **Embedders** - fastembed sentence models (all-MiniLM-L6-v2 by default)
//!   behind an [`Embedder`] trait, with a caching [`VectorEngine`]
//! - **Flat L2 index** - exact in-process search, ascending squared distance
//! - **Managed index** - Pinecone REST client or in-process HNSW service
//!   behind [`VectorService`], with bounded readiness polling
//! - **Pipelines** - embed, index, query and print for either backend
//!
//! ## Example
//!
//! ```ignore
//! use embedsearch_store::{run_local, Corpus, SearchConfig, VectorEngine};
//!
//! let engine = VectorEngine::new()?;
//! let hits = run_local(
//!     &engine,
//!     &Corpus::faiss_demo(),
//!     &SearchConfig::local_default(),
//!     &mut std::io::stdout(),
//! )?;
//! ```

pub mod corpus;
pub mod embedding;
pub mod error;
pub mod flat;
pub mod pipeline;
pub mod presenter;
pub mod remote;
pub mod similarity;

// Re-exports for convenience
pub use corpus::{Corpus, Document, DocumentTable};
pub use embedding::{BagOfWordsEmbedder, Embedder, FastEmbedConfig, FastEmbedder, VectorEngine};
pub use error::{EmbedSearchError, Result};
pub use flat::{FlatL2Index, Neighbor};
pub use pipeline::{run_local, run_remote, RemoteSettings, SearchConfig};
pub use presenter::LocalHit;
pub use remote::{
    CancelFlag, InMemoryVectorService, Metric, PineconeClient, PineconeConfig, RetryPolicy,
    VectorService,
};
