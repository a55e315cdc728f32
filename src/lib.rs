//! Paddock - bilingual Formula 1 trivia over retrieval-augmented generation
//!
//! Paddock harvests Formula 1 content from public sources, indexes it in a
//! hosted vector index and answers questions in English or Hindi.
//!
//! # Architecture
//!
//! Ingestion flows one way:
//!
//! - `scrapers` - Wikipedia, formula1.com (headless browser), OpenF1, news sites, RSS
//! - `chunking` - token-bounded recursive splitting with metadata
//! - `embedding` - embeddings from an OpenAI-compatible API
//! - `vector_store` - Pinecone (or in-memory) storage and search
//!
//! Answering flows the other way:
//!
//! - `language` - English/Hindi detection and translation
//! - `llm` - Groq chat completions
//! - `rag` - retrieval, prompting and answer post-processing
//!
//! `orchestrator` ties the pieces together and `cli` exposes them, including
//! the chat web server.
//!
//! # Example
//!
//! ```rust,no_run
//! use paddock::config::Settings;
//! use paddock::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings).await?;
//!
//!     let report = orchestrator.scrape_and_update().await?;
//!     println!("Indexed {} chunks", report.created_chunks);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod language;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod scrapers;
pub mod vector_store;

pub use error::{PaddockError, Result};
