//! Vocabulary bag-of-words embeddings
//!
//! One dimension per vocabulary term, term counts L2-normalised. No model
//! download, fully deterministic; used for offline runs and tests.

use std::collections::BTreeMap;

use super::Embedder;
use crate::error::{EmbedSearchError, Result};
use crate::similarity::l2_normalize;

pub struct BagOfWordsEmbedder {
    vocabulary: BTreeMap<String, usize>,
}

impl BagOfWordsEmbedder {
    /// Build the vocabulary from every term in `texts`
    ///
    /// Terms outside the vocabulary are ignored at embedding time, so include
    /// queries here if they should contribute.
    pub fn from_texts<'a, I>(texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut terms: Vec<String> = texts.into_iter().flat_map(tokenize).collect();
        terms.sort();
        terms.dedup();

        if terms.is_empty() {
            return Err(EmbedSearchError::model("bag-of-words vocabulary is empty"));
        }

        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term, i))
            .collect();

        Ok(Self { vocabulary })
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        for term in tokenize(text) {
            if let Some(&slot) = self.vocabulary.get(&term) {
                vector[slot] += 1.0;
            }
        }
        l2_normalize(&mut vector);
        vector
    }
}

/// Lowercased alphanumeric runs
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Embedder for BagOfWordsEmbedder {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }

    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("What is FAISS?"),
            vec!["what".to_string(), "is".to_string(), "faiss".to_string()]
        );
    }

    #[test]
    fn test_dimension_is_vocabulary_size() {
        let embedder = BagOfWordsEmbedder::from_texts(["a b", "b c"]).unwrap();
        assert_eq!(embedder.dimension(), 3);
    }

    #[test]
    fn test_empty_vocabulary_is_model_error() {
        let err = BagOfWordsEmbedder::from_texts(["  ", "?!"]).err().unwrap();
        assert!(matches!(err, EmbedSearchError::ModelLoad(_)));
    }

    #[test]
    fn test_embeddings_are_deterministic_and_normalised() {
        let embedder = BagOfWordsEmbedder::from_texts(["vectors represent data"]).unwrap();
        let a = embedder.embed("Vectors represent data").unwrap();
        let b = embedder.embed("vectors REPRESENT data").unwrap();
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_terms_give_zero_vector() {
        let embedder = BagOfWordsEmbedder::from_texts(["alpha beta"]).unwrap();
        let v = embedder.embed("gamma").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_terms_raise_similarity() {
        let embedder =
            BagOfWordsEmbedder::from_texts(["faiss search library", "gpu operations"]).unwrap();
        let batch = embedder
            .embed_batch(&["faiss search", "faiss search library", "gpu operations"])
            .unwrap();
        assert_eq!(batch.len(), 3);
        assert!(cosine_similarity(&batch[0], &batch[1]) > cosine_similarity(&batch[0], &batch[2]));
    }
}
