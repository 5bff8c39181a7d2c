//! Embedding generation for indexing and retrieval.
//!
//! One [`EmbeddingService`] is built per process and shared by ingestion and query,
//! so both paths always embed with the same model.

mod hashing;
mod local;
mod openai;

pub use hashing::{HashingEmbedder, DEFAULT_DIMENSIONS};
pub use local::{FastEmbedder, DEFAULT_LOCAL_MODEL};
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings, Settings};
use crate::error::{DocQaError, Result};
use crate::openai::ClientOptions;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}

/// Process-scoped handle to the configured embedder.
#[derive(Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Build the embedder selected by the settings.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let dimensions = settings.dimensions as usize;
        let embedder: Arc<dyn Embedder> = match settings.provider {
            EmbeddingProvider::FastEmbed => Arc::new(FastEmbedder::new(
                &settings.local_model,
                Settings::expand_path(&settings.cache_dir),
            )?),
            EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::with_dimensions(dimensions)),
            EmbeddingProvider::OpenAI => {
                let mut options = ClientOptions::new(settings.api_key()?);
                if let Some(base) = &settings.api_base {
                    options = options.with_api_base(base.as_str());
                }
                Arc::new(OpenAIEmbedder::with_config(&options, &settings.model, dimensions)?)
            }
        };

        info!(
            "Using {} embeddings ({}, {} dimensions)",
            settings.provider,
            embedder.model_name(),
            embedder.dimensions()
        );
        Ok(Self::new(embedder))
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embedder.embed(text).await?;
        self.check_vector(&vector)?;
        Ok(vector)
    }

    /// Embed a batch, verifying one vector of the expected width per input.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(DocQaError::Embedding(format!(
                "Embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        for vector in &vectors {
            self.check_vector(vector)?;
        }
        Ok(vectors)
    }

    /// A vector must have the expected width and a finite, non-zero norm.
    ///
    /// A zero vector scores 0 against every query and could never be retrieved.
    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        let expected = self.embedder.dimensions();
        if vector.len() != expected {
            return Err(DocQaError::Embedding(format!(
                "Embedding has {} dimensions, expected {}",
                vector.len(),
                expected
            )));
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(DocQaError::Embedding(format!(
                "{} produced a degenerate embedding (norm {})",
                self.embedder.model_name(),
                norm
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("model", &self.embedder.model_name())
            .field("dimensions", &self.embedder.dimensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns one vector too few.
    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 0.0]; texts.len().saturating_sub(1)])
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "short"
        }
    }

    #[tokio::test]
    async fn test_count_mismatch_is_embedding_error() {
        let service = EmbeddingService::new(Arc::new(ShortEmbedder));
        let err = service
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DocQaError::Embedding(_)));
    }

    /// Returns the zero vector for every input.
    struct ZeroEmbedder;

    #[async_trait]
    impl Embedder for ZeroEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 3])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.0; 3]; texts.len()])
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "zero"
        }
    }

    #[tokio::test]
    async fn test_zero_vector_is_embedding_error() {
        let service = EmbeddingService::new(Arc::new(ZeroEmbedder));
        assert!(matches!(
            service.embed("anything").await.unwrap_err(),
            DocQaError::Embedding(_)
        ));
        assert!(matches!(
            service.embed_batch(&["a".to_string()]).await.unwrap_err(),
            DocQaError::Embedding(_)
        ));
    }

    #[test]
    fn test_from_settings_defaults_to_local_model() {
        // Model files are fetched lazily, so building the service stays offline
        let service = EmbeddingService::from_settings(&EmbeddingSettings::default()).unwrap();
        assert_eq!(service.dimensions(), 384);
        assert_eq!(service.model_name(), DEFAULT_LOCAL_MODEL);
    }

    #[test]
    fn test_hashing_provider_uses_configured_width() {
        let settings = EmbeddingSettings {
            provider: EmbeddingProvider::Hashing,
            dimensions: 512,
            ..Default::default()
        };
        let service = EmbeddingService::from_settings(&settings).unwrap();
        assert_eq!(service.dimensions(), 512);
        assert_eq!(service.model_name(), "hashing-sha256");
    }

    #[test]
    fn test_openai_provider_requires_key() {
        let settings = EmbeddingSettings {
            provider: EmbeddingProvider::OpenAI,
            api_key_env: "DOCQA_TEST_UNSET_EMBEDDING_KEY".to_string(),
            ..Default::default()
        };
        let err = EmbeddingService::from_settings(&settings).unwrap_err();
        assert!(matches!(err, DocQaError::Config(_)));
    }
}
