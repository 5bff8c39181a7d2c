//! Vector store abstraction for docqa.
//!
//! A store holds named collections of indexed chunks. Collections are append-only:
//! entries are inserted in batches and queried by cosine similarity.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::{SqliteVectorStore, DATABASE_FILE};

use crate::document::Chunk;
use crate::error::{DocQaError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

/// Metadata stored alongside each entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// JSON-encoded list of heading strings.
    pub headings: String,
    pub page: Option<i64>,
    pub content_type: Option<String>,
}

impl EntryMetadata {
    /// Build the stored metadata of a chunk.
    pub fn from_chunk(chunk: &Chunk) -> Result<Self> {
        Ok(Self {
            headings: serde_json::to_string(&chunk.headings)?,
            page: chunk.page.map(i64::from),
            content_type: chunk.content_type.clone(),
        })
    }

    /// Decode the heading list. Undecodable JSON yields no headings.
    pub fn heading_list(&self) -> Vec<String> {
        serde_json::from_str(&self.headings).unwrap_or_default()
    }
}

/// A nearest-neighbour match.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub text: String,
    pub metadata: EntryMetadata,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

impl QueryMatch {
    /// Convert back into a chunk.
    pub fn to_chunk(&self) -> Chunk {
        Chunk {
            text: self.text.clone(),
            headings: self.metadata.heading_list(),
            page: self
                .metadata
                .page
                .and_then(|p| u32::try_from(p).ok()),
            content_type: self.metadata.content_type.clone(),
        }
    }
}

/// Summary information about a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub count: usize,
    pub dimension: Option<usize>,
    pub created_at: DateTime<Utc>,
}

/// A named, append-only set of indexed entries.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    /// Insert a batch of entries.
    ///
    /// All slices must have the same length, ids must be new, and every embedding must
    /// match the collection dimension (fixed by the first successful insert). A batch
    /// that violates any of these is rejected whole.
    async fn insert(
        &self,
        ids: &[String],
        embeddings: &[Vec<f32>],
        texts: &[String],
        metadatas: &[EntryMetadata],
    ) -> Result<()>;

    /// Return up to `k` entries ordered by descending similarity.
    ///
    /// Equal scores keep insertion order.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<QueryMatch>>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize>;

    /// Embedding dimension, once the first batch has been inserted.
    async fn dimension(&self) -> Result<Option<usize>>;

    /// Reserve `n` fresh ids, in order.
    async fn allocate_ids(&self, n: usize) -> Result<Vec<String>>;
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Open a collection, creating it if needed.
    async fn get_or_create(&self, name: &str) -> Result<Arc<dyn Collection>>;

    /// List all collections.
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>>;
}

/// Check a batch before anything is written. Returns the batch dimension.
pub(crate) fn validate_batch(
    ids: &[String],
    embeddings: &[Vec<f32>],
    texts: &[String],
    metadatas: &[EntryMetadata],
    dimension: Option<usize>,
) -> Result<Option<usize>> {
    if embeddings.len() != ids.len() || texts.len() != ids.len() || metadatas.len() != ids.len()
    {
        return Err(DocQaError::Store(format!(
            "Argument lengths differ: {} ids, {} embeddings, {} texts, {} metadatas",
            ids.len(),
            embeddings.len(),
            texts.len(),
            metadatas.len()
        )));
    }

    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(DocQaError::Store(format!("Duplicate id in batch: {}", id)));
        }
    }

    let Some(first) = embeddings.first() else {
        return Ok(dimension);
    };
    let expected = dimension.unwrap_or(first.len());
    if expected == 0 {
        return Err(DocQaError::Store("Embeddings must not be empty".to_string()));
    }
    if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
        return Err(DocQaError::Store(format!(
            "Embedding dimension {} does not match collection dimension {}",
            bad.len(),
            expected
        )));
    }

    Ok(Some(expected))
}

/// Check a query vector against the collection dimension.
pub(crate) fn validate_query(embedding: &[f32], dimension: Option<usize>) -> Result<()> {
    match dimension {
        Some(d) if d != embedding.len() => Err(DocQaError::Store(format!(
            "Query dimension {} does not match collection dimension {}",
            embedding.len(),
            d
        ))),
        _ => Ok(()),
    }
}

/// Sort `(seq, match)` candidates best first and keep the top `k`.
pub(crate) fn rank(mut candidates: Vec<(i64, QueryMatch)>, k: usize) -> Vec<QueryMatch> {
    candidates.sort_by(|(seq_a, a), (seq_b, b)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(seq_a.cmp(seq_b))
    });
    candidates.truncate(k);
    candidates.into_iter().map(|(_, m)| m).collect()
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::EntryMetadata;

    /// Owned argument vectors for one `insert` call.
    pub struct Batch {
        pub ids: Vec<String>,
        pub embeddings: Vec<Vec<f32>>,
        pub texts: Vec<String>,
        pub metadatas: Vec<EntryMetadata>,
    }

    pub fn batch(entries: &[(&str, Vec<f32>, &str)]) -> Batch {
        Batch {
            ids: entries.iter().map(|(id, _, _)| id.to_string()).collect(),
            embeddings: entries.iter().map(|(_, e, _)| e.clone()).collect(),
            texts: entries.iter().map(|(_, _, t)| t.to_string()).collect(),
            metadatas: entries
                .iter()
                .map(|_| EntryMetadata {
                    headings: "[]".to_string(),
                    page: None,
                    content_type: Some("TXT".to_string()),
                })
                .collect(),
        }
    }
}
