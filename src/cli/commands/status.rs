//! Status command - index contents and configuration checks.

use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use crate::embedding::EmbeddingService;
use crate::engine::QaEngine;
use crate::vector_store::DATABASE_FILE;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run the status command.
pub async fn run_status(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("docqa status");
    println!();

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let mut api_checks = vec![check_api_key(&settings.llm.api_key_env, "answers")];
    if settings.embedding.provider == EmbeddingProvider::OpenAI {
        api_checks.push(check_api_key(&settings.embedding.api_key_env, "embeddings"));
    }
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);
    Output::kv("LLM", &format!("{} @ {}", settings.llm.model, settings.llm.api_base));
    match EmbeddingService::from_settings(&settings.embedding) {
        Ok(service) => Output::kv(
            "Embeddings",
            &format!(
                "{} ({}, {} dimensions)",
                settings.embedding.provider,
                service.model_name(),
                service.dimensions()
            ),
        ),
        Err(e) => {
            let check = CheckResult::error(
                "Embeddings",
                &e.to_string(),
                "Check the [embedding] section of your config",
            );
            check.print();
            checks.push(check);
        }
    }

    println!();

    println!("{}", style("Index").bold());
    let index_checks = check_index(settings).await;
    for check in &index_checks {
        check.print();
    }
    checks.extend(index_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!("{} problem(s) found.", errors));
    } else if warnings > 0 {
        Output::warning(&format!("Ready, with {} warning(s).", warnings));
    } else {
        Output::success("Ready.");
    }

    Ok(())
}

/// Check that an API key environment variable is set, without printing it.
fn check_api_key(var: &str, purpose: &str) -> CheckResult {
    match std::env::var(var) {
        Ok(key) if key.trim().is_empty() => CheckResult::error(
            var,
            "empty",
            &format!("Set with: export {}='...'", var),
        ),
        Ok(key) => CheckResult::ok(
            var,
            &format!("configured for {} ({} characters)", purpose, key.len()),
        ),
        Err(_) => CheckResult::error(
            var,
            "not set",
            &format!("Set with: export {}='...'", var),
        ),
    }
}

/// Inspect the vector store and the configured collection.
async fn check_index(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if settings.vector_store.provider == "memory" {
        results.push(CheckResult::warning(
            "Vector store",
            "in-memory, the index does not persist between runs",
            "Use provider = \"sqlite\" under [vector_store] to keep the index",
        ));
        return results;
    }

    if settings.vector_store.provider == "sqlite" {
        let db_path = settings.storage_dir().join(DATABASE_FILE);
        if db_path.exists() {
            let size = std::fs::metadata(&db_path)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "unknown size".to_string());
            results.push(CheckResult::ok(
                "Database",
                &format!("{} ({})", db_path.display(), size),
            ));
        } else {
            results.push(CheckResult::warning(
                "Database",
                &format!("{} (not created yet)", db_path.display()),
                "Created on first ingest",
            ));
            return results;
        }
    }

    let store = match QaEngine::open_store(settings) {
        Ok(store) => store,
        Err(e) => {
            results.push(CheckResult::error(
                "Vector store",
                &e.to_string(),
                "Check the [vector_store] section of your config",
            ));
            return results;
        }
    };

    let collections = match store.list_collections().await {
        Ok(collections) => collections,
        Err(e) => {
            results.push(CheckResult::error("Vector store", &e.to_string(), "Is the database file readable?"));
            return results;
        }
    };

    let name = &settings.vector_store.collection;
    match collections.iter().find(|c| &c.name == name) {
        Some(info) if info.count > 0 => {
            results.push(CheckResult::ok(
                "Collection",
                &format!(
                    "{}: {} chunks, created {}",
                    name,
                    info.count,
                    info.created_at.format("%Y-%m-%d %H:%M")
                ),
            ));

            let expected = EmbeddingService::from_settings(&settings.embedding)
                .map(|s| s.dimensions())
                .unwrap_or(settings.embedding.dimensions as usize);
            if let Some(dimension) = info.dimension.filter(|d| *d != expected) {
                results.push(CheckResult::error(
                    "Embedding dimension",
                    &format!("index has {}, embedder produces {}", dimension, expected),
                    "Queries will fail; re-index with the current embedding settings",
                ));
            }
        }
        _ => results.push(CheckResult::warning(
            "Collection",
            &format!("{}: empty, answers are not grounded", name),
            "Add a document with: docqa ingest <file>",
        )),
    }

    results
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: docqa config edit",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }

    #[tokio::test]
    async fn test_index_check_on_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.vector_store.path = dir.path().to_string_lossy().into_owned();

        let results = check_index(&settings).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Warning);
    }

    #[tokio::test]
    async fn test_memory_store_warns_instead_of_reporting_empty() {
        let mut settings = Settings::default();
        settings.vector_store.provider = "memory".to_string();

        let results = check_index(&settings).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Warning);
        assert!(results[0].message.contains("does not persist"));
    }

    #[test]
    fn test_missing_api_key_is_error() {
        let result = check_api_key("DOCQA_TEST_UNSET_STATUS_KEY", "answers");
        assert_eq!(result.status, CheckStatus::Error);
    }
}
