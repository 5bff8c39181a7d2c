//! OpenAI embeddings implementation.

use super::Embedder;
use crate::error::{DocQaError, Result};
use crate::openai::{create_client, ClientOptions};
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Maximum inputs per embeddings request.
const BATCH_SIZE: usize = 100;

/// Embedder backed by an OpenAI-compatible embeddings endpoint.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder using `text-embedding-3-small` at 1536 dimensions.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        Self::with_config(options, "text-embedding-3-small", 1536)
    }

    /// Create an embedder with a custom model and dimensions.
    pub fn with_config(options: &ClientOptions, model: &str, dimensions: usize) -> Result<Self> {
        Ok(Self {
            client: create_client(options)?,
            model: model.to_string(),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| DocQaError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| DocQaError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| DocQaError::Embedding(format!("Embedding API error: {}", e)))?;

            if response.data.len() != chunk.len() {
                return Err(DocQaError::Embedding(format!(
                    "Expected {} embeddings, received {}",
                    chunk.len(),
                    response.data.len()
                )));
            }

            // The API may return items out of order
            let mut embeddings = response.data;
            embeddings.sort_by_key(|e| e.index);
            all_embeddings.extend(embeddings.into_iter().map(|e| e.embedding));
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let options = ClientOptions::new("sk-test");
        let embedder = OpenAIEmbedder::new(&options).unwrap();
        assert_eq!(embedder.dimensions(), 1536);
        assert_eq!(embedder.model_name(), "text-embedding-3-small");

        let embedder =
            OpenAIEmbedder::with_config(&options, "text-embedding-3-large", 3072).unwrap();
        assert_eq!(embedder.dimensions(), 3072);
    }
}
