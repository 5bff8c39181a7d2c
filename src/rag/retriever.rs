//! Question-to-chunks retrieval.

use super::RetrievedChunk;
use crate::document::Chunk;
use crate::embedding::EmbeddingService;
use crate::error::Result;
use crate::vector_store::Collection;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds questions and looks up the nearest chunks in a collection.
#[derive(Clone)]
pub struct Retriever {
    collection: Arc<dyn Collection>,
    embeddings: EmbeddingService,
}

impl Retriever {
    pub fn new(collection: Arc<dyn Collection>, embeddings: EmbeddingService) -> Self {
        Self {
            collection,
            embeddings,
        }
    }

    /// The collection searched by this retriever.
    pub fn collection(&self) -> &Arc<dyn Collection> {
        &self.collection
    }

    /// Top-`k` chunks for `question`, best first.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .search(question, k)
            .await?
            .into_iter()
            .map(|r| r.chunk)
            .collect())
    }

    /// Like [`Retriever::retrieve`], keeping ids and similarity scores.
    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    pub async fn search(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let query_embedding = self.embeddings.embed(question).await?;
        let matches = self.collection.query(&query_embedding, k).await?;

        debug!("Retrieved {} chunks", matches.len());
        Ok(matches
            .into_iter()
            .map(|m| RetrievedChunk {
                chunk: m.to_chunk(),
                id: m.id,
                score: m.score,
            })
            .collect())
    }
}
