//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::engine::QaEngine;
use crate::error::DocQaError;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(path: &Path, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docqa status' to review your configuration.");
        return Err(e.into());
    }

    let engine = QaEngine::new(settings).await?;

    let spinner = Output::spinner(&format!("Processing {}...", path.display()));
    let result = engine.process_document(path).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::success(&format!("Indexed {}", path.display()));
            Output::kv("Format", report.format.tag());
            Output::kv("Chunks indexed", &report.chunks_indexed.to_string());
            if report.chunks_skipped > 0 {
                Output::kv("Empty segments skipped", &report.chunks_skipped.to_string());
            }
            Output::kv("Collection", report.collection.name());
            Output::kv(
                "Total chunks in collection",
                &report.collection.count().await?.to_string(),
            );
        }
        Err(e) => {
            Output::error(&format!("Failed to ingest document: {}", e));
            if let DocQaError::UnsupportedFormat(_) = e {
                Output::info(&format!(
                    "Supported extensions: {}",
                    engine.registry().supported_extensions().join(", ")
                ));
            }
            return Err(e.into());
        }
    }

    Ok(())
}
