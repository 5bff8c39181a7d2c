//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// Run the config command against the config file at `config_path`.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path.to_path_buf())?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::kv("Config file", &config_path.display().to_string());
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path.to_path_buf())?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `raw`.
///
/// The value is parsed as a TOML literal when possible (`8`, `true`, `0.2`), otherwise
/// taken as a plain string.
fn set_value(settings: &Settings, key: &str, raw: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings).context("Failed to serialize config")?;

    let (sections, field) = match key.rsplit_once('.') {
        Some((sections, field)) => (sections.split('.').collect::<Vec<_>>(), field),
        None => (Vec::new(), key),
    };

    let mut table = root
        .as_table_mut()
        .ok_or_else(|| anyhow!("Config root is not a table"))?;
    for section in sections {
        table = table
            .get_mut(section)
            .and_then(toml::Value::as_table_mut)
            .ok_or_else(|| anyhow!("Unknown config section: {}", section))?;
    }
    table.insert(field.to_string(), parse_value(raw));

    let updated: Settings = root
        .try_into()
        .with_context(|| format!("Invalid value for {}: {}", key, raw))?;

    // Unknown fields are silently dropped by deserialization
    if lookup(&toml::Value::try_from(&updated)?, key).is_none() {
        return Err(anyhow!("Unknown config key: {}", key));
    }

    Ok(updated)
}

fn parse_value(raw: &str) -> toml::Value {
    format!("value = {}", raw)
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn lookup<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.').try_fold(value, |v, part| v.get(part))
}
