//! Managed vector service data types
//!
//! Field names follow the service's JSON wire format.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EmbedSearchError, Result};

/// Metadata attached to a stored vector
pub type Metadata = Map<String, Value>;

/// Distance metric of a managed index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    #[serde(rename = "dotproduct")]
    DotProduct,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::DotProduct => "dotproduct",
        }
    }

    /// Whether larger scores mean closer matches
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, Self::Euclidean)
    }
}

impl FromStr for Metric {
    type Err = EmbedSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" => Ok(Self::Euclidean),
            "dotproduct" | "dot" => Ok(Self::DotProduct),
            other => Err(EmbedSearchError::invalid(format!("unknown metric: {other}"))),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serverless placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerlessSpec {
    pub cloud: String,
    pub region: String,
}

impl Default for ServerlessSpec {
    fn default() -> Self {
        Self {
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// Deployment section of an index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serverless: Option<ServerlessSpec>,
    /// Pod-based deployments are reported but never created here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<Value>,
}

/// Desired index shape; also the create-index request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub spec: DeploymentSpec,
}

impl IndexSpec {
    /// Serverless index with the default cloud and region
    pub fn serverless(name: impl Into<String>, dimension: usize, metric: Metric) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric,
            spec: DeploymentSpec {
                serverless: Some(ServerlessSpec::default()),
                pod: None,
            },
        }
    }

    pub fn with_region(mut self, cloud: impl Into<String>, region: impl Into<String>) -> Self {
        self.spec.serverless = Some(ServerlessSpec {
            cloud: cloud.into(),
            region: region.into(),
        });
        self
    }
}

/// Lifecycle state reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexState {
    Initializing,
    InitializationFailed,
    ScalingUp,
    ScalingDown,
    ScalingUpPodSize,
    ScalingDownPodSize,
    Terminating,
    Ready,
    Disabled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub ready: bool,
    pub state: IndexState,
}

/// An index as described by the control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    /// Data-plane host, without scheme
    #[serde(default)]
    pub host: String,
    pub status: IndexStatus,
    #[serde(default)]
    pub spec: DeploymentSpec,
}

impl IndexDescription {
    pub fn is_ready(&self) -> bool {
        self.status.ready
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexList {
    #[serde(default)]
    pub indexes: Vec<IndexDescription>,
}

/// A vector with its id and optional metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: None,
        }
    }

    /// Attach the original text under the `text` metadata key
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert("text".to_string(), Value::String(text.into()));
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpsertRequest<'a> {
    pub vectors: &'a [VectorRecord],
    #[serde(skip_serializing_if = "str::is_empty")]
    pub namespace: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    #[serde(default)]
    pub upserted_count: usize,
}

/// Metadata filter in the service's `$eq` / `$in` operator syntax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataFilter(pub Value);

impl MetadataFilter {
    /// `{field: {"$eq": value}}`
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self(serde_json::json!({ field: { "$eq": value.into() } }))
    }

    /// `{field: {"$in": [values]}}`
    pub fn in_values<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self(serde_json::json!({ field: { "$in": values } }))
    }

    /// `{"$and": [filters]}`
    pub fn and(filters: Vec<MetadataFilter>) -> Self {
        let clauses: Vec<Value> = filters.into_iter().map(|f| f.0).collect();
        Self(serde_json::json!({ "$and": clauses }))
    }

    /// Evaluate against stored metadata
    ///
    /// Supports `$eq`, `$ne`, `$in`, `$nin`, `$and`, `$or` and bare-value
    /// equality. Unknown operators never match.
    pub fn matches(&self, metadata: Option<&Metadata>) -> bool {
        let empty = Metadata::new();
        eval_filter(&self.0, metadata.unwrap_or(&empty))
    }
}

fn eval_filter(filter: &Value, metadata: &Metadata) -> bool {
    let Some(clauses) = filter.as_object() else {
        return false;
    };

    clauses.iter().all(|(key, condition)| match key.as_str() {
        "$and" => condition
            .as_array()
            .is_some_and(|items| items.iter().all(|f| eval_filter(f, metadata))),
        "$or" => condition
            .as_array()
            .is_some_and(|items| items.iter().any(|f| eval_filter(f, metadata))),
        field => eval_condition(metadata.get(field), condition),
    })
}

fn eval_condition(actual: Option<&Value>, condition: &Value) -> bool {
    let Some(ops) = condition.as_object() else {
        return actual == Some(condition);
    };

    ops.iter().all(|(op, expected)| match op.as_str() {
        "$eq" => actual == Some(expected),
        "$ne" => actual != Some(expected),
        "$in" => expected
            .as_array()
            .is_some_and(|items| actual.is_some_and(|a| items.contains(a))),
        "$nin" => expected
            .as_array()
            .is_some_and(|items| !actual.is_some_and(|a| items.contains(a))),
        _ => false,
    })
}

/// Nearest-neighbour query body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub include_metadata: bool,
    pub include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<MetadataFilter>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

impl QueryRequest {
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            filter: None,
            namespace: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl QueryMatch {
    /// The `text` metadata value, if present
    pub fn text(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("text")?.as_str()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<QueryMatch>,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceStats {
    #[serde(default)]
    pub vector_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub dimension: usize,
    #[serde(default)]
    pub index_fullness: f32,
    #[serde(default)]
    pub total_vector_count: u64,
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metric_wire_names() {
        assert_eq!(serde_json::to_value(Metric::Cosine).unwrap(), json!("cosine"));
        assert_eq!(
            serde_json::to_value(Metric::DotProduct).unwrap(),
            json!("dotproduct")
        );
        assert_eq!("Euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert!("manhattan".parse::<Metric>().is_err());
        assert!(!Metric::Euclidean.higher_is_better());
    }

    #[test]
    fn test_create_request_body() {
        let spec = IndexSpec::serverless("exampleindex", 384, Metric::Cosine);
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "name": "exampleindex",
                "dimension": 384,
                "metric": "cosine",
                "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } }
            })
        );
    }

    #[test]
    fn test_parse_index_description() {
        let body = json!({
            "name": "exampleindex",
            "dimension": 384,
            "metric": "cosine",
            "host": "exampleindex-abc123.svc.aped-4627-b74a.pinecone.io",
            "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } },
            "status": { "ready": false, "state": "Initializing" },
            "deletion_protection": "disabled"
        });
        let desc: IndexDescription = serde_json::from_value(body).unwrap();
        assert_eq!(desc.dimension, 384);
        assert!(!desc.is_ready());
        assert_eq!(desc.status.state, IndexState::Initializing);
    }

    #[test]
    fn test_unknown_state_tolerated() {
        let status: IndexStatus =
            serde_json::from_value(json!({ "ready": false, "state": "Migrating" })).unwrap();
        assert_eq!(status.state, IndexState::Unknown);
    }

    #[test]
    fn test_query_request_body() {
        let mut request = QueryRequest::new(vec![0.5, 0.25], 3);
        request.filter = Some(MetadataFilter::eq("text", "hello"));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "vector": [0.5, 0.25],
                "topK": 3,
                "includeMetadata": true,
                "includeValues": false,
                "filter": { "text": { "$eq": "hello" } }
            })
        );
    }

    #[test]
    fn test_parse_query_response() {
        let body = json!({
            "matches": [
                { "id": "0", "score": 0.91, "metadata": { "text": "Pinecone is a vector database." } },
                { "id": "4", "score": 0.55 }
            ],
            "namespace": "",
            "usage": { "readUnits": 5 }
        });
        let response: QueryResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.matches.len(), 2);
        assert_eq!(response.matches[0].text(), Some("Pinecone is a vector database."));
        assert_eq!(response.matches[1].text(), None);
    }

    #[test]
    fn test_parse_stats() {
        let body = json!({
            "namespaces": { "": { "vectorCount": 9 } },
            "dimension": 384,
            "indexFullness": 0.0,
            "totalVectorCount": 9
        });
        let stats: IndexStats = serde_json::from_value(body).unwrap();
        assert_eq!(stats.total_vector_count, 9);
        assert_eq!(stats.namespaces[""].vector_count, 9);
    }

    #[test]
    fn test_record_with_text_metadata() {
        let record = VectorRecord::new("3", vec![1.0]).with_text("hello");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "id": "3", "values": [1.0], "metadata": { "text": "hello" } })
        );
    }

    #[test]
    fn test_filter_evaluation() {
        let mut metadata = Metadata::new();
        metadata.insert("genre".into(), json!("docs"));
        metadata.insert("year".into(), json!(2024));

        assert!(MetadataFilter::eq("genre", "docs").matches(Some(&metadata)));
        assert!(!MetadataFilter::eq("genre", "news").matches(Some(&metadata)));
        assert!(MetadataFilter::in_values("year", [2023, 2024]).matches(Some(&metadata)));
        assert!(MetadataFilter(json!({ "year": 2024 })).matches(Some(&metadata)));
        assert!(MetadataFilter(json!({ "genre": { "$ne": "news" } })).matches(Some(&metadata)));
        assert!(!MetadataFilter(json!({ "genre": { "$nin": ["docs"] } })).matches(Some(&metadata)));
        assert!(MetadataFilter::and(vec![
            MetadataFilter::eq("genre", "docs"),
            MetadataFilter::eq("year", 2024),
        ])
        .matches(Some(&metadata)));
        assert!(MetadataFilter(json!({
            "$or": [{ "genre": "news" }, { "year": { "$eq": 2024 } }]
        }))
        .matches(Some(&metadata)));
        assert!(!MetadataFilter::eq("genre", "docs").matches(None));
    }
}
