//! End-to-end embed, index, query and print pipelines
//!
//! Both pipelines take their embedder and (for remote) vector service as
//! arguments and write progress and results to the given writer.

use std::io::Write;

use crate::corpus::{Corpus, DocumentTable, DEFAULT_LOCAL_QUERY, DEFAULT_REMOTE_QUERY};
use crate::embedding::Embedder;
use crate::error::{EmbedSearchError, Result};
use crate::flat::FlatL2Index;
use crate::presenter::{write_local_results, write_remote_results, LocalHit};
use crate::remote::{
    ensure_index, wait_until_ready, CancelFlag, EnsureOutcome, IndexSpec, MetadataFilter, Metric,
    QueryMatch, RemoteIndex, RetryPolicy, VectorRecord, VectorService,
};

/// Query settings shared by both pipelines
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub query: String,
    /// Number of neighbours to retrieve (default: 3)
    pub top_k: usize,
}

impl SearchConfig {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(EmbedSearchError::invalid("top_k must be at least 1"));
        }
        Ok(())
    }

    /// "What is FAISS?", k = 3
    pub fn local_default() -> Self {
        Self::new(DEFAULT_LOCAL_QUERY, 3)
    }

    /// "Is pinecone vector database?", k = 3
    pub fn remote_default() -> Self {
        Self::new(DEFAULT_REMOTE_QUERY, 3)
    }
}

/// Managed index settings
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub index_name: String,
    pub metric: Metric,
    pub cloud: String,
    pub region: String,
    pub namespace: String,
    pub retry: RetryPolicy,
    /// Records per upsert request (default: 100)
    pub upsert_batch_size: usize,
    pub filter: Option<MetadataFilter>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            index_name: "exampleindex".to_string(),
            metric: Metric::Cosine,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            namespace: String::new(),
            retry: RetryPolicy::default(),
            upsert_batch_size: 100,
            filter: None,
        }
    }
}

fn embed_corpus<W: Write>(
    embedder: &dyn Embedder,
    corpus: &Corpus,
    out: &mut W,
) -> Result<Vec<Vec<f32>>> {
    if corpus.is_empty() {
        return Err(EmbedSearchError::invalid("corpus is empty"));
    }

    let embeddings = embedder.embed_batch(&corpus.texts())?;
    if embeddings.len() != corpus.len() {
        return Err(EmbedSearchError::embedding(format!(
            "expected {} embeddings, got {}",
            corpus.len(),
            embeddings.len()
        )));
    }

    writeln!(out, "Converted {} texts to embeddings.", corpus.len())?;
    writeln!(out, "Vector dimension: {}", embedder.dimension())?;
    Ok(embeddings)
}

fn embed_query<W: Write>(embedder: &dyn Embedder, query: &str, out: &mut W) -> Result<Vec<f32>> {
    let vector = embedder.embed(query)?;
    writeln!(out, "Encoded query: '{}'", query)?;
    Ok(vector)
}

/// Flat L2 pipeline: embed, index, search, print
///
/// Returns the printed hits, closest first.
pub fn run_local<W: Write>(
    embedder: &dyn Embedder,
    corpus: &Corpus,
    config: &SearchConfig,
    out: &mut W,
) -> Result<Vec<LocalHit>> {
    config.validate()?;
    let embeddings = embed_corpus(embedder, corpus, out)?;

    let mut index = FlatL2Index::new(embedder.dimension())?;
    let ids = index.add(&embeddings)?;
    let mut table = DocumentTable::new();
    table.bind(ids, corpus.documents())?;
    writeln!(
        out,
        "Created flat L2 index and added {} vectors.",
        index.len()
    )?;

    let query_vector = embed_query(embedder, &config.query, out)?;
    let neighbors = index.search(&query_vector, config.top_k)?;

    let hits = neighbors
        .into_iter()
        .enumerate()
        .map(|(i, n)| {
            let doc = table
                .get(n.id)
                .ok_or_else(|| EmbedSearchError::query(format!("no document for id {}", n.id)))?;
            Ok(LocalHit {
                rank: i + 1,
                id: n.id,
                text: doc.text.clone(),
                distance: n.distance,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    write_local_results(out, &hits)?;
    Ok(hits)
}

/// Managed index pipeline: embed, ensure index, wait, upsert, query, print
///
/// Returns the printed matches, best first.
pub fn run_remote<W: Write>(
    embedder: &dyn Embedder,
    service: &dyn VectorService,
    corpus: &Corpus,
    config: &SearchConfig,
    settings: &RemoteSettings,
    cancel: &CancelFlag,
    out: &mut W,
) -> Result<Vec<QueryMatch>> {
    config.validate()?;
    let embeddings = embed_corpus(embedder, corpus, out)?;

    let spec = IndexSpec::serverless(&settings.index_name, embedder.dimension(), settings.metric)
        .with_region(&settings.cloud, &settings.region);
    match ensure_index(service, &spec)? {
        EnsureOutcome::Created => writeln!(out, "Created new index: {}", spec.name)?,
        EnsureOutcome::Existing { mismatch: None } => {
            writeln!(out, "Using existing index: {}", spec.name)?
        }
        EnsureOutcome::Existing {
            mismatch: Some(m),
        } => writeln!(
            out,
            "Using existing index: {} (warning: index is {}d/{}, embeddings are {}d/{})",
            spec.name, m.actual_dimension, m.actual_metric, m.expected_dimension, m.expected_metric
        )?,
    }

    let description = wait_until_ready(service, &spec.name, &settings.retry, cancel)?;
    let index = RemoteIndex::connect(service, description)?.with_namespace(&settings.namespace);
    writeln!(out, "Connected to index: {}", index.name())?;

    let records: Vec<VectorRecord> = corpus
        .documents()
        .iter()
        .zip(embeddings)
        .map(|(doc, values)| VectorRecord::new(doc.id.clone(), values).with_text(&doc.text))
        .collect();
    let upserted = index.upsert(&records, settings.upsert_batch_size)?;
    writeln!(out, "Inserted {} vectors into the index.", upserted)?;

    let stats = index.stats()?;
    writeln!(out, "Index stats: {}", serde_json::to_string(&stats)?)?;

    let query_vector = embed_query(embedder, &config.query, out)?;
    let matches = index.query(query_vector, config.top_k, true, settings.filter.clone())?;

    write_remote_results(out, &matches)?;
    Ok(matches)
}
