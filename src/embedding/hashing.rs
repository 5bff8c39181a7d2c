//! Feature-hashing embedder for tests and offline use.
//!
//! Terms are hashed with SHA-256 into a fixed number of signed buckets, so the same
//! text yields the same vector in every process and on every platform. Word order is
//! not captured; reworded sentences over the same terms share a vector.

use super::Embedder;
use crate::error::{DocQaError, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Default vector width.
pub const DEFAULT_DIMENSIONS: usize = 1024;

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for",
    "from", "how", "i", "in", "is", "it", "its", "of", "on", "or", "that", "the", "this",
    "to", "was", "what", "when", "where", "which", "who", "why", "will", "with", "you",
];

const SUFFIXES: &[&str] = &["ing", "ed", "es", "s"];

/// Minimum stem length left after suffix stripping.
const MIN_STEM: usize = 3;

/// Deterministic bag-of-words embedder that needs no network access.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn vectorize(&self, text: &str) -> Result<Vec<f32>> {
        let terms = terms(text);
        if terms.is_empty() {
            return Err(DocQaError::Embedding("Cannot embed empty text".to_string()));
        }

        let mut vector = vec![0f32; self.dimensions];
        for term in &terms {
            let digest = Sha256::digest(term.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        // Opposite-signed terms sharing a bucket can cancel out completely
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return Err(DocQaError::Embedding(format!(
                "Hashed terms of {:?} cancel to a zero vector",
                text
            )));
        }
        vector.iter_mut().for_each(|v| *v /= norm);
        Ok(vector)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalized terms of `text`.
///
/// Stop words are dropped unless nothing else remains; text without any
/// alphanumeric characters is used whole.
fn terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let content: Vec<String> = tokens
        .iter()
        .filter(|t| !STOP_WORDS.contains(t))
        .map(|t| stem(t))
        .collect();
    if !content.is_empty() {
        return content;
    }

    if !tokens.is_empty() {
        return tokens.iter().map(|t| stem(t)).collect();
    }

    let trimmed = lowered.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![trimmed.to_string()]
    }
}

fn stem(word: &str) -> String {
    for suffix in SUFFIXES {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.chars().count() >= MIN_STEM {
                return base.to_string();
            }
        }
    }
    word.to_string()
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.vectorize(text)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.vectorize(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "hashing-sha256"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::cosine_similarity;

    #[test]
    fn test_terms_drop_stop_words_and_stem() {
        assert_eq!(
            terms("What is the boiling point of water?"),
            vec!["boil", "point", "water"]
        );
        assert_eq!(terms("Water boils at 100C."), vec!["water", "boil", "100c"]);
    }

    #[test]
    fn test_terms_fallbacks() {
        assert_eq!(terms("What is it?"), vec!["what", "is", "it"]);
        assert_eq!(terms("  ???  "), vec!["???"]);
        assert!(terms("   ").is_empty());
    }

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let embedder = HashingEmbedder::with_dimensions(64);
        let a = embedder.embed("Replace the filter monthly").await.unwrap();
        let b = embedder.embed("Replace the filter monthly").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_related_text_scores_higher() {
        let embedder = HashingEmbedder::new();
        let question = embedder.embed("What is the boiling point of water?").await.unwrap();
        let water = embedder.embed("Water boils at 100C.").await.unwrap();
        let sky = embedder.embed("The sky is blue.").await.unwrap();

        assert!(cosine_similarity(&question, &water) > cosine_similarity(&question, &sky));
    }

    #[tokio::test]
    async fn test_cancelling_terms_are_an_error() {
        // Both terms hash to bucket 677 of 1024 with opposite signs
        let err = HashingEmbedder::new().embed("zq1x zq580x").await.unwrap_err();
        assert!(matches!(err, DocQaError::Embedding(_)));
        assert!(HashingEmbedder::new().embed("zq1x filler").await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_text_is_an_error() {
        let err = HashingEmbedder::new().embed("").await.unwrap_err();
        assert!(matches!(err, DocQaError::Embedding(_)));
    }
}
