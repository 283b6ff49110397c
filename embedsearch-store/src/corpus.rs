//! Documents, corpora and the index-id to document table

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EmbedSearchError, Result};

/// Query used by the local demo
pub const DEFAULT_LOCAL_QUERY: &str = "What is FAISS?";

/// Query used by the remote demo
pub const DEFAULT_REMOTE_QUERY: &str = "Is pinecone vector database?";

const FAISS_DEMO_TEXTS: &[&str] = &[
    "FAISS is a library for efficient similarity search.",
    "Vectors represent data in numerical form.",
    "Embedding models convert text to vectors.",
    "Local vector databases can be faster for small datasets.",
    "FAISS supports both CPU and GPU operations.",
];

const PINECONE_DEMO_TEXTS: &[&str] = &[
    "Pinecone is a vector database.",
    "Vectors represent data in numerical form.",
    "Embedding models convert text to vectors.",
    "Convert data → embeddings (vectors of floats).",
    "Store vectors + metadata in Pinecone index.",
    "Query = embedding → Pinecone finds nearest neighbors.",
    "Uses ANN search (cosine/dot product).",
    "Supports metadata filters + scalable infra.",
    "Use cases: RAG, semantic search, recommendations, anomaly detection.",
];

/// An immutable text with its identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Ordered collection of documents
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Build a corpus from texts; ids are the 0-based positions as strings
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let documents = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Document::new(i.to_string(), text))
            .collect();
        Self { documents }
    }

    /// The five sentences of the local flat-index demo
    pub fn faiss_demo() -> Self {
        Self::from_texts(FAISS_DEMO_TEXTS.iter().copied())
    }

    /// The nine sentences of the managed-index demo
    pub fn pinecone_demo() -> Self {
        Self::from_texts(PINECONE_DEMO_TEXTS.iter().copied())
    }

    /// Load one document per non-empty line of a UTF-8 text file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let corpus = Self::from_texts(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );

        if corpus.is_empty() {
            return Err(EmbedSearchError::invalid(format!(
                "corpus file has no documents: {}",
                path.display()
            )));
        }

        log::info!("Loaded {} documents from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Document texts in corpus order
    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Explicit mapping from local index ids back to documents
///
/// Filled from the id range that `FlatL2Index::add` hands back, so lookups
/// never depend on the corpus and the index happening to share an order.
#[derive(Debug, Default)]
pub struct DocumentTable {
    entries: HashMap<usize, Document>,
}

impl DocumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind consecutive index ids to documents
    pub fn bind(&mut self, ids: std::ops::Range<usize>, documents: &[Document]) -> Result<()> {
        if ids.len() != documents.len() {
            return Err(EmbedSearchError::invalid(format!(
                "{} index ids for {} documents",
                ids.len(),
                documents.len()
            )));
        }
        for (id, doc) in ids.zip(documents.iter()) {
            self.entries.insert(id, doc.clone());
        }
        Ok(())
    }

    pub fn get(&self, id: usize) -> Option<&Document> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_demo_corpora() {
        let local = Corpus::faiss_demo();
        assert_eq!(local.len(), 5);
        assert_eq!(
            local.documents()[0].text,
            "FAISS is a library for efficient similarity search."
        );

        let remote = Corpus::pinecone_demo();
        assert_eq!(remote.len(), 9);
        assert_eq!(remote.documents()[8].id, "8");
    }

    #[test]
    fn test_from_texts_assigns_positional_ids() {
        let corpus = Corpus::from_texts(["a", "b", "c"]);
        let ids: Vec<&str> = corpus.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(corpus.texts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_from_file_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first line").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   second line  ").unwrap();

        let corpus = Corpus::from_file(file.path()).unwrap();
        assert_eq!(corpus.texts(), vec!["first line", "second line"]);
    }

    #[test]
    fn test_from_file_empty_is_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = Corpus::from_file(file.path()).unwrap_err();
        assert!(matches!(err, EmbedSearchError::InvalidArgument(_)));
    }

    #[test]
    fn test_document_table_bind_and_lookup() {
        let corpus = Corpus::from_texts(["x", "y"]);
        let mut table = DocumentTable::new();
        table.bind(10..12, corpus.documents()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(10).unwrap().text, "x");
        assert_eq!(table.get(11).unwrap().text, "y");
        assert!(table.get(0).is_none());
    }

    #[test]
    fn test_document_table_bind_length_mismatch() {
        let corpus = Corpus::from_texts(["x"]);
        let mut table = DocumentTable::new();
        assert!(table.bind(0..2, corpus.documents()).is_err());
        assert!(table.is_empty());
    }
}
