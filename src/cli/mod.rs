//! CLI module for docqa.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docqa - Ask questions about your documents
///
/// Index PDF, Word, PowerPoint, HTML and text files, then ask questions answered
/// from the most relevant passages.
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse, chunk, embed and index a document
    Ingest {
        /// Path to a .pdf, .docx, .pptx, .html/.htm or .txt file
        path: PathBuf,
    },

    /// Ask a question about the indexed document
    Ask {
        /// The question to ask
        question: String,

        /// Number of chunks to retrieve (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// LLM model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the chunks most similar to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Ask questions interactively
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show index and configuration status
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "retrieval.top_k")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_options() {
        let cli = Cli::try_parse_from(["docqa", "-vv", "ask", "What is the torque?", "-k", "3", "--json"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask {
                question,
                top_k,
                json,
                model,
            } => {
                assert_eq!(question, "What is the torque?");
                assert_eq!(top_k, Some(3));
                assert!(json);
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["docqa", "config", "set", "retrieval.top_k", "8"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Set { .. }
            }
        ));
    }
}
