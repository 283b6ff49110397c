//! Vector service abstraction
//!
//! One trait over the managed index API so the HTTP client and the
//! in-process service are interchangeable.

use super::types::{
    IndexDescription, IndexSpec, IndexStats, QueryRequest, QueryResponse, VectorRecord,
};
use crate::error::Result;

/// Control-plane and data-plane operations of a managed vector database
///
/// Errors are returned as reported by the service (HTTP status, transport).
/// Mapping them onto operation-specific errors is the caller's job.
pub trait VectorService: Send + Sync {
    /// All indexes visible to the caller
    fn list_indexes(&self) -> Result<Vec<IndexDescription>>;

    /// Describe one index; `IndexNotFound` or HTTP 404 when absent
    fn describe_index(&self, name: &str) -> Result<IndexDescription>;

    /// Start creating an index; HTTP 409 when the name is taken
    fn create_index(&self, spec: &IndexSpec) -> Result<IndexDescription>;

    /// Insert or overwrite records by id, returning the upserted count
    fn upsert(&self, index: &str, namespace: &str, records: &[VectorRecord]) -> Result<usize>;

    /// Top-k nearest records by the index metric
    fn query(&self, index: &str, request: &QueryRequest) -> Result<QueryResponse>;

    /// Vector counts per namespace
    fn describe_index_stats(&self, index: &str) -> Result<IndexStats>;
}
