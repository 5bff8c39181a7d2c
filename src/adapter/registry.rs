//! Adapter registry keyed by file extension.

use super::{DocxAdapter, FormatAdapter, HtmlAdapter, PdfAdapter, PptxAdapter, TextAdapter};
use crate::chunking::ChunkingConfig;
use crate::document::{DocumentFormat, Segment};
use crate::error::{DocQaError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Registry of format adapters.
pub struct AdapterRegistry {
    /// Extension to adapter mapping
    by_extension: HashMap<String, Arc<dyn FormatAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Create a registry with every built-in adapter.
    pub fn with_defaults(chunking: ChunkingConfig) -> Self {
        let mut registry = Self::new();
        registry.register(PdfAdapter::new(chunking));
        registry.register(DocxAdapter);
        registry.register(PptxAdapter);
        registry.register(HtmlAdapter);
        registry.register(TextAdapter);
        registry
    }

    /// Register an adapter under each of its extensions.
    pub fn register<A: FormatAdapter + 'static>(&mut self, adapter: A) {
        let adapter: Arc<dyn FormatAdapter> = Arc::new(adapter);
        for ext in adapter.extensions() {
            self.by_extension
                .insert(ext.to_ascii_lowercase(), adapter.clone());
        }
    }

    /// Get the adapter for a file, based on its extension.
    pub fn get_for_path(&self, path: &Path) -> Result<Arc<dyn FormatAdapter>> {
        let ext = DocumentFormat::extension_of(path).ok_or_else(|| {
            DocQaError::UnsupportedFormat(format!("{} has no file extension", path.display()))
        })?;

        self.by_extension.get(&ext).cloned().ok_or_else(|| {
            DocQaError::UnsupportedFormat(format!(
                ".{} (supported: {})",
                ext,
                self.supported_extensions().join(", ")
            ))
        })
    }

    /// Sorted list of registered extensions.
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.by_extension.keys().cloned().collect();
        exts.sort();
        exts
    }

    /// Read a file and parse it with the matching adapter.
    ///
    /// The format is resolved before the file is touched, so unsupported files fail
    /// without any I/O.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn load(&self, path: &Path) -> Result<(DocumentFormat, Vec<Segment>)> {
        let adapter = self.get_for_path(path)?;
        let format = adapter.format();

        let bytes = tokio::fs::read(path).await?;
        debug!("Parsing {} bytes as {}", bytes.len(), format);

        let segments = tokio::task::spawn_blocking(move || adapter.parse(&bytes))
            .await
            .map_err(|e| DocQaError::Parse(format!("Parser task failed: {}", e)))??;

        debug!("Extracted {} segments", segments.len());
        Ok((format, segments))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults(ChunkingConfig::default())
    }
}
