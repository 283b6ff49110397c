//! In-process vector service
//!
//! Implements [`VectorService`] without a network. Namespaces above a size
//! threshold are searched through an instant-distance HNSW graph, smaller
//! ones (and filtered queries) by exact scan. Readiness can be delayed by a
//! number of `describe_index` polls to exercise the wait logic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use instant_distance::{Builder, HnswMap, Point, Search};
use parking_lot::RwLock;

use super::service::VectorService;
use super::types::{
    DeploymentSpec, IndexDescription, IndexSpec, IndexState, IndexStats, IndexStatus, Metadata,
    Metric, NamespaceStats, QueryMatch, QueryRequest, QueryResponse, VectorRecord,
};
use crate::error::{EmbedSearchError, Result};
use crate::similarity::{cosine_similarity, dot_product, squared_l2};

/// Namespaces smaller than this are scanned exactly
const HNSW_MIN_POINTS: usize = 64;

/// HNSW point carrying its index metric
#[derive(Clone)]
struct RecordPoint {
    vector: Vec<f32>,
    metric: Metric,
}

impl Point for RecordPoint {
    fn distance(&self, other: &Self) -> f32 {
        // HNSW minimises distance, so similarities are flipped
        match self.metric {
            Metric::Cosine => 1.0 - cosine_similarity(&self.vector, &other.vector),
            Metric::DotProduct => -dot_product(&self.vector, &other.vector),
            Metric::Euclidean => squared_l2(&self.vector, &other.vector),
        }
    }
}

fn score(metric: Metric, query: &[f32], stored: &[f32]) -> f32 {
    match metric {
        Metric::Cosine => cosine_similarity(query, stored),
        Metric::DotProduct => dot_product(query, stored),
        Metric::Euclidean => squared_l2(query, stored),
    }
}

#[derive(Clone)]
struct StoredRecord {
    values: Vec<f32>,
    metadata: Option<Metadata>,
}

#[derive(Default)]
struct Namespace {
    records: BTreeMap<String, StoredRecord>,
    hnsw: Option<HnswMap<RecordPoint, String>>,
}

impl Namespace {
    fn rebuild_hnsw(&mut self, metric: Metric) {
        if self.records.len() < HNSW_MIN_POINTS {
            self.hnsw = None;
            return;
        }

        let (points, ids): (Vec<RecordPoint>, Vec<String>) = self
            .records
            .iter()
            .map(|(id, record)| {
                (
                    RecordPoint {
                        vector: record.values.clone(),
                        metric,
                    },
                    id.clone(),
                )
            })
            .unzip();

        self.hnsw = Some(
            Builder::default()
                .seed(42)
                .ef_construction(100)
                .build(points, ids),
        );
    }

    /// Candidate ids: HNSW neighbours when available, every id otherwise
    fn candidates(&self, query: &[f32], metric: Metric, exact: bool) -> Vec<String> {
        match (&self.hnsw, exact) {
            (Some(hnsw), false) => {
                let point = RecordPoint {
                    vector: query.to_vec(),
                    metric,
                };
                let mut search = Search::default();
                hnsw.search(&point, &mut search)
                    .map(|item| item.value.clone())
                    .collect()
            }
            _ => self.records.keys().cloned().collect(),
        }
    }
}

struct MemoryIndex {
    description: IndexDescription,
    polls_until_ready: u32,
    namespaces: HashMap<String, Namespace>,
}

/// Process-local stand-in for a managed vector database
pub struct InMemoryVectorService {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
    ready_after_polls: u32,
}

impl Default for InMemoryVectorService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVectorService {
    /// Indexes are ready as soon as they are created
    pub fn new() -> Self {
        Self::with_readiness_delay(0)
    }

    /// New indexes report `Initializing` for `polls` describe calls
    pub fn with_readiness_delay(polls: u32) -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
            ready_after_polls: polls,
        }
    }

    /// New indexes never become ready
    pub fn never_ready() -> Self {
        Self::with_readiness_delay(u32::MAX)
    }

    /// Number of indexes created so far
    pub fn index_count(&self) -> usize {
        self.indexes.read().len()
    }

    fn status(polls_until_ready: u32) -> IndexStatus {
        if polls_until_ready == 0 {
            IndexStatus {
                ready: true,
                state: IndexState::Ready,
            }
        } else {
            IndexStatus {
                ready: false,
                state: IndexState::Initializing,
            }
        }
    }

    fn bad_request(msg: String) -> EmbedSearchError {
        EmbedSearchError::HttpStatus {
            status: 400,
            body: msg,
        }
    }
}

impl VectorService for InMemoryVectorService {
    fn list_indexes(&self) -> Result<Vec<IndexDescription>> {
        let indexes = self.indexes.read();
        let mut list: Vec<IndexDescription> =
            indexes.values().map(|ix| ix.description.clone()).collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let mut indexes = self.indexes.write();
        let index = indexes
            .get_mut(name)
            .ok_or_else(|| EmbedSearchError::not_found(name))?;

        // Each poll moves a pending index one step closer to ready
        if index.polls_until_ready > 0 && index.polls_until_ready != u32::MAX {
            index.polls_until_ready -= 1;
        }
        index.description.status = Self::status(index.polls_until_ready);
        Ok(index.description.clone())
    }

    fn create_index(&self, spec: &IndexSpec) -> Result<IndexDescription> {
        if spec.dimension == 0 {
            return Err(Self::bad_request("dimension must be positive".to_string()));
        }

        let mut indexes = self.indexes.write();
        if indexes.contains_key(&spec.name) {
            return Err(EmbedSearchError::HttpStatus {
                status: 409,
                body: format!("Resource {} already exists", spec.name),
            });
        }

        let description = IndexDescription {
            name: spec.name.clone(),
            dimension: spec.dimension,
            metric: spec.metric,
            host: format!("{}.in-memory.local", spec.name),
            status: Self::status(self.ready_after_polls),
            spec: DeploymentSpec {
                serverless: spec.spec.serverless.clone(),
                pod: None,
            },
        };

        log::info!(
            "Created in-memory index {} ({}d, {})",
            spec.name,
            spec.dimension,
            spec.metric
        );

        indexes.insert(
            spec.name.clone(),
            MemoryIndex {
                description: description.clone(),
                polls_until_ready: self.ready_after_polls,
                namespaces: HashMap::new(),
            },
        );
        Ok(description)
    }

    fn upsert(&self, index: &str, namespace: &str, records: &[VectorRecord]) -> Result<usize> {
        let mut indexes = self.indexes.write();
        let index = indexes
            .get_mut(index)
            .ok_or_else(|| EmbedSearchError::not_found(index))?;
        let dimension = index.description.dimension;

        if let Some(bad) = records.iter().find(|r| r.values.len() != dimension) {
            return Err(Self::bad_request(format!(
                "Vector dimension {} does not match the dimension of the index {}",
                bad.values.len(),
                dimension
            )));
        }

        let ns = index.namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            ns.records.insert(
                record.id.clone(),
                StoredRecord {
                    values: record.values.clone(),
                    metadata: record.metadata.clone(),
                },
            );
        }
        ns.rebuild_hnsw(index.description.metric);

        Ok(records.len())
    }

    fn query(&self, index: &str, request: &QueryRequest) -> Result<QueryResponse> {
        let indexes = self.indexes.read();
        let index = indexes
            .get(index)
            .ok_or_else(|| EmbedSearchError::not_found(index))?;
        let metric = index.description.metric;

        if request.vector.len() != index.description.dimension {
            return Err(Self::bad_request(format!(
                "Query vector dimension {} does not match the dimension of the index {}",
                request.vector.len(),
                index.description.dimension
            )));
        }

        let Some(ns) = index.namespaces.get(&request.namespace) else {
            return Ok(QueryResponse {
                matches: Vec::new(),
                namespace: request.namespace.clone(),
            });
        };

        let exact = request.filter.is_some();
        let mut matches: Vec<QueryMatch> = ns
            .candidates(&request.vector, metric, exact)
            .into_iter()
            .filter_map(|id| ns.records.get(&id).map(|record| (id, record)))
            .filter(|(_, record)| {
                request
                    .filter
                    .as_ref()
                    .map_or(true, |f| f.matches(record.metadata.as_ref()))
            })
            .map(|(id, record)| QueryMatch {
                id,
                score: score(metric, &request.vector, &record.values),
                values: if request.include_values {
                    record.values.clone()
                } else {
                    Vec::new()
                },
                metadata: if request.include_metadata {
                    record.metadata.clone()
                } else {
                    None
                },
            })
            .collect();

        matches.sort_by(|a, b| {
            let ord = a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal);
            let ord = if metric.higher_is_better() { ord.reverse() } else { ord };
            ord.then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(request.top_k);

        Ok(QueryResponse {
            matches,
            namespace: request.namespace.clone(),
        })
    }

    fn describe_index_stats(&self, index: &str) -> Result<IndexStats> {
        let indexes = self.indexes.read();
        let index = indexes
            .get(index)
            .ok_or_else(|| EmbedSearchError::not_found(index))?;

        let namespaces: BTreeMap<String, NamespaceStats> = index
            .namespaces
            .iter()
            .map(|(name, ns)| {
                (
                    name.clone(),
                    NamespaceStats {
                        vector_count: ns.records.len() as u64,
                    },
                )
            })
            .collect();

        Ok(IndexStats {
            dimension: index.description.dimension,
            index_fullness: 0.0,
            total_vector_count: namespaces.values().map(|ns| ns.vector_count).sum(),
            namespaces,
        })
    }
}
