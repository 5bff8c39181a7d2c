//! Local embeddings with fastembed.
//!
//! The ONNX model is downloaded into the cache directory and loaded on first use, on a
//! blocking worker. Inference also runs on the blocking pool.

use super::Embedder;
use crate::error::{DocQaError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Default local model.
pub const DEFAULT_LOCAL_MODEL: &str = "BAAI/bge-small-en-v1.5";

/// Supported local models and their output width.
fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    match name {
        "BAAI/bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, 384)),
        "BAAI/bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768)),
        "sentence-transformers/all-MiniLM-L6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
        _ => None,
    }
}

/// Embedder backed by a local fastembed model.
pub struct FastEmbedder {
    model_name: String,
    model: EmbeddingModel,
    dimensions: usize,
    cache_dir: PathBuf,
    // `TextEmbedding::embed` takes `&mut self`
    engine: Arc<Mutex<Option<TextEmbedding>>>,
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl FastEmbedder {
    /// Select a local model by name. Nothing is downloaded until the first embedding.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self> {
        let (model, dimensions) = resolve_model(model_name).ok_or_else(|| {
            DocQaError::Config(format!(
                "Unknown local embedding model: {} (supported: BAAI/bge-small-en-v1.5, \
                 BAAI/bge-base-en-v1.5, sentence-transformers/all-MiniLM-L6-v2)",
                model_name
            ))
        })?;

        Ok(Self {
            model_name: model_name.to_string(),
            model,
            dimensions,
            cache_dir,
            engine: Arc::new(Mutex::new(None)),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| DocQaError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(DocQaError::Embedding("Cannot embed empty text".to_string()));
        }

        let engine = Arc::clone(&self.engine);
        let model = self.model.clone();
        let model_name = self.model_name.clone();
        let cache_dir = self.cache_dir.clone();
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut guard = engine
                .lock()
                .map_err(|_| DocQaError::Embedding("Embedding model lock poisoned".to_string()))?;

            if guard.is_none() {
                info!("Loading local embedding model {} from {:?}", model_name, cache_dir);
                let options = InitOptions::new(model)
                    .with_cache_dir(cache_dir)
                    .with_show_download_progress(false);
                let loaded = TextEmbedding::try_new(options).map_err(|e| {
                    DocQaError::Embedding(format!(
                        "Failed to load local embedding model {}: {}",
                        model_name, e
                    ))
                })?;
                *guard = Some(loaded);
            }

            let embedding = guard
                .as_mut()
                .ok_or_else(|| DocQaError::Embedding("Embedding model not loaded".to_string()))?;

            debug!("Embedding {} texts locally", texts.len());
            embedding
                .embed(texts, None)
                .map_err(|e| DocQaError::Embedding(format!("Local embedding failed: {}", e)))
        })
        .await
        .map_err(|e| DocQaError::Embedding(format!("Embedding task failed: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_models_have_fixed_width() {
        let embedder = FastEmbedder::new(DEFAULT_LOCAL_MODEL, PathBuf::from("models")).unwrap();
        assert_eq!(embedder.dimensions(), 384);
        assert_eq!(embedder.model_name(), "BAAI/bge-small-en-v1.5");

        let base = FastEmbedder::new("BAAI/bge-base-en-v1.5", PathBuf::from("models")).unwrap();
        assert_eq!(base.dimensions(), 768);
    }

    #[test]
    fn test_unknown_model_is_config_error() {
        let err = FastEmbedder::new("bert-large", PathBuf::from("models")).unwrap_err();
        assert!(matches!(err, DocQaError::Config(_)));
    }

    #[tokio::test]
    async fn test_blank_text_rejected_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = FastEmbedder::new(DEFAULT_LOCAL_MODEL, dir.path().to_path_buf()).unwrap();
        let err = embedder.embed("   ").await.unwrap_err();
        assert!(matches!(err, DocQaError::Embedding(_)));
        assert!(embedder.engine.lock().unwrap().is_none());
    }
}
