//! Interactive question loop.

use super::ask::UNGROUNDED_WARNING;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::engine::{EngineState, QaEngine};
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
///
/// Every question is answered independently; no conversation history is kept.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> anyhow::Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docqa status' to review your configuration.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.llm.model = model;
    }
    let engine = QaEngine::new(settings).await?;

    println!("\n{}", style("docqa chat").bold().cyan());
    println!(
        "{}",
        style("Type your questions, 'ingest <path>' to add a document, or 'exit' to quit.").dim()
    );
    if engine.state().await? == EngineState::Uninitialized {
        Output::warning(UNGROUNDED_WARNING);
    }
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if let Some(path) = input.strip_prefix("ingest ") {
            let path = Settings::expand_path(path.trim());
            let spinner = Output::spinner("Processing document...");
            let result = engine.process_document(&path).await;
            spinner.finish_and_clear();

            match result {
                Ok(report) => Output::success(&format!(
                    "Indexed {} chunks from {}",
                    report.chunks_indexed,
                    path.display()
                )),
                Err(e) => Output::error(&format!("Failed to ingest document: {}", e)),
            }
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = engine.ask(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(answer) => {
                println!("\n{} {}\n", style("docqa:").cyan().bold(), answer.format_for_display());
                if !answer.grounded {
                    Output::warning(UNGROUNDED_WARNING);
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
