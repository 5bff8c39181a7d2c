//! Configuration settings for docqa.

use crate::chunking::ChunkingConfig;
use crate::error::{DocQaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub chunking: ChunkingConfig,
    pub ingest: IngestSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.docqa".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local ONNX model run through fastembed.
    #[default]
    FastEmbed,
    /// Deterministic feature hashing, for tests and offline use.
    Hashing,
    /// OpenAI-compatible embeddings endpoint.
    OpenAI,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fastembed" | "local" => Ok(EmbeddingProvider::FastEmbed),
            "hashing" => Ok(EmbeddingProvider::Hashing),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::FastEmbed => write!(f, "fastembed"),
            EmbeddingProvider::Hashing => write!(f, "hashing"),
            EmbeddingProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (fastembed, hashing, openai).
    pub provider: EmbeddingProvider,
    /// Local model name (fastembed provider).
    pub local_model: String,
    /// Where downloaded local models are cached.
    pub cache_dir: String,
    /// Embedding model to use (openai provider).
    pub model: String,
    /// Embedding dimensions (hashing and openai providers; local models have a fixed width).
    pub dimensions: u32,
    /// Base URL of the embeddings API. None uses the OpenAI default.
    pub api_base: Option<String>,
    /// Environment variable holding the embeddings API key.
    pub api_key_env: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::FastEmbed,
            local_model: crate::embedding::DEFAULT_LOCAL_MODEL.to_string(),
            cache_dir: "~/.docqa/models".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1024,
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Storage directory holding `index.sqlite3`.
    pub path: String,
    /// Name of the collection documents are indexed into.
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            path: "~/.docqa/index".to_string(),
            collection: "document_chunks".to_string(),
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Number of chunks embedded and inserted per batch.
    pub batch_size: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self { batch_size: 64 }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Language model settings for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model name.
    pub model: String,
    /// Base URL of the OpenAI-compatible chat API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature. None leaves it to the provider.
    pub temperature: Option<f32>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "mixtral-8x7b-32768".to_string(),
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: None,
            timeout_secs: 300,
        }
    }
}

impl LlmSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        read_key(&self.api_key_env)
    }
}

impl EmbeddingSettings {
    /// Read the embeddings API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        read_key(&self.api_key_env)
    }
}

fn read_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(DocQaError::Config(format!(
            "{} environment variable not set",
            var
        ))),
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DocQaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docqa")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded vector store directory.
    pub fn storage_dir(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.vector_store.collection, "document_chunks");
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.ingest.batch_size, 64);
        assert_eq!(settings.llm.model, "mixtral-8x7b-32768");
        assert_eq!(settings.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(settings.embedding.provider, EmbeddingProvider::FastEmbed);
        assert_eq!(settings.embedding.local_model, "BAAI/bge-small-en-v1.5");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[retrieval]
top_k = 8

[embedding]
provider = "openai"

[chunking]
max_tokens = 256
"#,
        )
        .unwrap();

        assert_eq!(settings.retrieval.top_k, 8);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::OpenAI);
        assert_eq!(settings.embedding.dimensions, 1024);
        assert_eq!(settings.chunking.max_tokens, 256);
        assert_eq!(settings.chunking.min_tokens, 64);
        assert_eq!(settings.vector_store.collection, "document_chunks");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.llm.temperature = Some(0.2);
        settings.prompts.variables.insert("team".into(), "Ops".into());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.llm.temperature, Some(0.2));
        assert_eq!(loaded.prompts.variables.get("team").map(String::as_str), Some("Ops"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.retrieval.top_k, 5);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::OpenAI));
        assert_eq!("local".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::FastEmbed));
        assert_eq!("hashing".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::Hashing));
        assert!("bert".parse::<EmbeddingProvider>().is_err());
    }
}
