//! docqa - question answering over documents
//!
//! A local-first library and CLI that indexes a document and answers questions about
//! it with retrieval-augmented generation.
//!
//! # Overview
//!
//! - Parse PDF, DOCX, PPTX, HTML and plain text into structured segments
//! - Split segments into heading-aware chunks
//! - Embed chunks and store them in a persistent vector collection
//! - Retrieve the most relevant chunks for a question and ground the answer in them
//!
//! # Architecture
//!
//! - `adapter` - Format adapters and the registry that picks one per file
//! - `chunking` - Layout-aware chunking
//! - `embedding` - Embedding generation (local fastembed model, OpenAI, or a hashing stub)
//! - `vector_store` - Vector collections (SQLite or in-memory)
//! - `rag` - Retrieval, prompt assembly and answer generation
//! - `engine` - Pipeline coordination
//! - `config` - Settings and prompt templates
//!
//! # Example
//!
//! ```rust,no_run
//! use docqa::config::Settings;
//! use docqa::engine::QaEngine;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let engine = QaEngine::new(settings).await?;
//!
//!     let report = engine.process_document(Path::new("manual.pdf")).await?;
//!     println!("Indexed {} chunks", report.chunks_indexed);
//!
//!     let answer = engine.ask("What torque do the wheel bolts need?").await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod openai;
pub mod rag;
pub mod vector_store;

pub use error::{DocQaError, Result};
