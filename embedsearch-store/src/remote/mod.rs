//! Managed vector database backend
//!
//! [`VectorService`] is the seam between the pipeline and a concrete
//! service: [`PineconeClient`] over HTTPS, or [`InMemoryVectorService`]
//! in-process.

mod lifecycle;
mod memory;
mod pinecone;
mod service;
mod types;

pub use lifecycle::{
    ensure_index, wait_until_ready, CancelFlag, EnsureOutcome, RemoteIndex, RetryPolicy,
    SpecMismatch,
};
pub use memory::InMemoryVectorService;
pub use pinecone::{PineconeClient, PineconeConfig, API_VERSION, DEFAULT_CONTROLLER_URL};
pub use service::VectorService;
pub use types::{
    DeploymentSpec, IndexDescription, IndexSpec, IndexState, IndexStats, IndexStatus, Metadata,
    MetadataFilter, Metric, NamespaceStats, QueryMatch, QueryRequest, QueryResponse,
    ServerlessSpec, VectorRecord,
};
