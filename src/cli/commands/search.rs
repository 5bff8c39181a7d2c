//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::EmbeddingService;
use crate::engine::QaEngine;
use crate::rag::Retriever;
use anyhow::Result;

/// Run the search command.
///
/// Search needs no language model, so it builds a retriever directly instead of a
/// full engine.
pub async fn run_search(query: &str, top_k: Option<usize>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let k = top_k.unwrap_or(settings.retrieval.top_k);
    let embeddings = EmbeddingService::from_settings(&settings.embedding)?;
    let store = QaEngine::open_store(&settings)?;
    let collection = store
        .get_or_create(&settings.vector_store.collection)
        .await?;

    if collection.count().await? == 0 {
        Output::warning("Nothing indexed yet. Use 'docqa ingest <file>' to add a document.");
        return Ok(());
    }

    let retriever = Retriever::new(collection, embeddings);

    let spinner = Output::spinner("Searching...");
    let results = retriever.search(query, k).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));
                for (i, result) in results.iter().enumerate() {
                    Output::search_result(i + 1, result);
                }
                println!();
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
