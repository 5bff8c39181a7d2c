//! In-memory vector store implementation.
//!
//! Useful for testing and one-off sessions; nothing survives the process.

use super::{
    cosine_similarity, rank, validate_batch, validate_query, Collection, CollectionInfo,
    EntryMetadata, QueryMatch, VectorStore,
};
use crate::error::{DocQaError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

fn poisoned<E: std::fmt::Display>(e: E) -> DocQaError {
    DocQaError::Store(format!("Failed to acquire lock: {}", e))
}

/// In-memory vector store.
#[derive(Default)]
pub struct MemoryVectorStore {
    collections: RwLock<BTreeMap<String, Arc<MemoryCollection>>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn get_or_create(&self, name: &str) -> Result<Arc<dyn Collection>> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)));
        Ok(Arc::clone(collection) as Arc<dyn Collection>)
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let collections = self.collections.read().map_err(poisoned)?;
        collections
            .values()
            .map(|c| {
                let state = c.state.read().map_err(poisoned)?;
                Ok(CollectionInfo {
                    name: c.name.clone(),
                    count: state.entries.len(),
                    dimension: state.dimension,
                    created_at: c.created_at,
                })
            })
            .collect()
    }
}

struct StoredEntry {
    id: String,
    embedding: Vec<f32>,
    text: String,
    metadata: EntryMetadata,
}

#[derive(Default)]
struct CollectionState {
    dimension: Option<usize>,
    next_id: u64,
    ids: HashSet<String>,
    entries: Vec<StoredEntry>,
}

/// A collection inside a [`MemoryVectorStore`].
pub struct MemoryCollection {
    name: String,
    created_at: DateTime<Utc>,
    state: RwLock<CollectionState>,
}

impl MemoryCollection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created_at: Utc::now(),
            state: RwLock::new(CollectionState::default()),
        }
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(
        &self,
        ids: &[String],
        embeddings: &[Vec<f32>],
        texts: &[String],
        metadatas: &[EntryMetadata],
    ) -> Result<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let dimension = validate_batch(ids, embeddings, texts, metadatas, state.dimension)?;

        if let Some(id) = ids.iter().find(|id| state.ids.contains(*id)) {
            return Err(DocQaError::Store(format!("Id already exists: {}", id)));
        }

        state.dimension = dimension;
        for (((id, embedding), text), metadata) in ids.iter().zip(embeddings).zip(texts).zip(metadatas) {
            state.ids.insert(id.clone());
            state.entries.push(StoredEntry {
                id: id.clone(),
                embedding: embedding.clone(),
                text: text.clone(),
                metadata: metadata.clone(),
            });
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<QueryMatch>> {
        let state = self.state.read().map_err(poisoned)?;
        validate_query(embedding, state.dimension)?;

        let candidates = state
            .entries
            .iter()
            .enumerate()
            .map(|(seq, entry)| {
                (
                    seq as i64,
                    QueryMatch {
                        id: entry.id.clone(),
                        text: entry.text.clone(),
                        metadata: entry.metadata.clone(),
                        score: cosine_similarity(embedding, &entry.embedding),
                    },
                )
            })
            .collect();

        Ok(rank(candidates, k))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().map_err(poisoned)?.entries.len())
    }

    async fn dimension(&self) -> Result<Option<usize>> {
        Ok(self.state.read().map_err(poisoned)?.dimension)
    }

    async fn allocate_ids(&self, n: usize) -> Result<Vec<String>> {
        let mut state = self.state.write().map_err(poisoned)?;
        let start = state.next_id;
        state.next_id += n as u64;
        Ok((start..state.next_id).map(|id| id.to_string()).collect())
    }
}
