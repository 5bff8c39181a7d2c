//! Question-answering engine for docqa.
//!
//! Wires format adapters, the embedding service, the vector store and answer
//! generation into the two public flows: ingesting a document and answering a question.

use crate::adapter::AdapterRegistry;
use crate::config::{Prompts, Settings};
use crate::document::{extract_chunks, DocumentFormat, ExtractedChunks};
use crate::embedding::EmbeddingService;
use crate::error::{DocQaError, Result};
use crate::rag::{
    format_context, Answer, AnswerGenerator, LanguageModel, OpenAIChatModel, RetrievedChunk,
    Retriever,
};
use crate::vector_store::{
    Collection, EntryMetadata, MemoryVectorStore, SqliteVectorStore, VectorStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Whether the collection holds any indexed chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing has been indexed; answers come from the model alone.
    Uninitialized,
    /// At least one document has been indexed; answers are grounded.
    Indexed,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Uninitialized => write!(f, "uninitialized"),
            EngineState::Indexed => write!(f, "indexed"),
        }
    }
}

/// The main engine for the docqa pipeline.
pub struct QaEngine {
    settings: Settings,
    registry: AdapterRegistry,
    embeddings: EmbeddingService,
    vector_store: Arc<dyn VectorStore>,
    collection: Arc<dyn Collection>,
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl QaEngine {
    /// Create an engine from settings.
    ///
    /// Fails with a configuration error when the language model API key is missing.
    pub async fn new(settings: Settings) -> Result<Self> {
        let model: Arc<dyn LanguageModel> = Arc::new(OpenAIChatModel::from_settings(&settings.llm)?);

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let embeddings = EmbeddingService::from_settings(&settings.embedding)?;
        let vector_store = Self::open_store(&settings)?;

        Self::with_components(settings, prompts, embeddings, vector_store, model).await
    }

    /// Create an engine with custom components.
    pub async fn with_components(
        settings: Settings,
        prompts: Prompts,
        embeddings: EmbeddingService,
        vector_store: Arc<dyn VectorStore>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let collection = vector_store
            .get_or_create(&settings.vector_store.collection)
            .await?;
        let registry = AdapterRegistry::with_defaults(settings.chunking.clone());
        let retriever = Retriever::new(Arc::clone(&collection), embeddings.clone());
        let generator = AnswerGenerator::new(model).with_prompts(prompts);

        Ok(Self {
            settings,
            registry,
            embeddings,
            vector_store,
            collection,
            retriever,
            generator,
        })
    }

    /// Open the vector store selected by the settings.
    pub fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
        match settings.vector_store.provider.as_str() {
            "sqlite" => Ok(Arc::new(SqliteVectorStore::open(&settings.storage_dir())?)),
            "memory" => Ok(Arc::new(MemoryVectorStore::new())),
            other => Err(DocQaError::Config(format!(
                "Unknown vector store provider: {}",
                other
            ))),
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        Arc::clone(&self.vector_store)
    }

    /// The collection documents are indexed into.
    pub fn collection(&self) -> Arc<dyn Collection> {
        Arc::clone(&self.collection)
    }

    /// Get the shared embedding service.
    pub fn embeddings(&self) -> &EmbeddingService {
        &self.embeddings
    }

    /// Get the adapter registry.
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Current state, derived from the persisted entry count.
    pub async fn state(&self) -> Result<EngineState> {
        Ok(if self.collection.count().await? > 0 {
            EngineState::Indexed
        } else {
            EngineState::Uninitialized
        })
    }

    /// Parse, chunk, embed and index a document.
    ///
    /// Chunks are indexed in batches; if a batch fails, earlier batches stay indexed.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn process_document(&self, path: &Path) -> Result<IngestReport> {
        let (format, segments) = self.registry.load(path).await?;
        let segment_count = segments.len();

        let ExtractedChunks { chunks, skipped } = extract_chunks(segments, format);
        info!(
            "Extracted {} chunks from {} segments ({} empty skipped)",
            chunks.len(),
            segment_count,
            skipped
        );

        let batch_size = self.settings.ingest.batch_size.max(1);
        let mut indexed = 0;

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embeddings.embed_batch(&texts).await?;
            let metadatas = batch
                .iter()
                .map(EntryMetadata::from_chunk)
                .collect::<Result<Vec<_>>>()?;

            let ids = self.collection.allocate_ids(batch.len()).await?;
            self.collection
                .insert(&ids, &embeddings, &texts, &metadatas)
                .await?;

            indexed += batch.len();
            info!("Indexed {} of {} chunks", indexed, chunks.len());
        }

        Ok(IngestReport {
            path: path.to_path_buf(),
            format,
            collection: Arc::clone(&self.collection),
            chunks_indexed: indexed,
            chunks_skipped: skipped,
        })
    }

    /// Answer a question using the configured number of chunks.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        self.query(question, self.settings.retrieval.top_k).await
    }

    /// Answer a question from the top-`k` chunks.
    ///
    /// With nothing indexed, retrieval is skipped and the answer is not grounded.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn query(&self, question: &str, k: usize) -> Result<Answer> {
        let sources = match self.state().await? {
            EngineState::Uninitialized => {
                info!("No document indexed, answering without context");
                Vec::new()
            }
            EngineState::Indexed => self.retriever.search(question, k).await?,
        };

        let chunks: Vec<_> = sources.iter().map(|s| s.chunk.clone()).collect();
        let context = format_context(&chunks);
        debug!("Retrieved context:\n{}", context);

        let mut answer = self.generator.generate(&context, question).await?;
        answer.sources = sources;
        Ok(answer)
    }

    /// Ranked chunks for a question, without generating an answer.
    pub async fn search(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        self.retriever.search(question, k).await
    }
}

/// Result of ingesting a document.
pub struct IngestReport {
    /// The ingested file.
    pub path: PathBuf,
    /// Detected format.
    pub format: DocumentFormat,
    /// Collection the chunks were written to.
    pub collection: Arc<dyn Collection>,
    /// Number of chunks indexed.
    pub chunks_indexed: usize,
    /// Number of blank segments dropped.
    pub chunks_skipped: usize,
}

impl std::fmt::Debug for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestReport")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("collection", &self.collection.name())
            .field("chunks_indexed", &self.chunks_indexed)
            .field("chunks_skipped", &self.chunks_skipped)
            .finish()
    }
}
