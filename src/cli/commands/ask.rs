//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::engine::QaEngine;
use anyhow::Result;

/// Warning shown when an answer was produced without document context.
pub(crate) const UNGROUNDED_WARNING: &str =
    "No document indexed. Response is from general AI knowledge.";

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    top_k: Option<usize>,
    model: Option<String>,
    json: bool,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docqa status' to review your configuration.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.llm.model = model;
    }
    let k = top_k.unwrap_or(settings.retrieval.top_k);

    let engine = QaEngine::new(settings).await?;

    let spinner = Output::spinner("Searching document...");
    let result = engine.query(question, k).await;
    spinner.finish_and_clear();

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("\n{}\n", answer.text.trim_end());

    if !answer.grounded {
        Output::warning(UNGROUNDED_WARNING);
    } else if !answer.sources.is_empty() {
        Output::header("Sources");
        for (i, source) in answer.sources.iter().enumerate() {
            Output::search_result(i + 1, source);
        }
        println!();
    }

    Ok(())
}
