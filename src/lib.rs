//! Pantry - retrieval-augmented answers over a food dataset
//!
//! Pantry loads a curated JSON catalog of food items into a hosted vector
//! index (Upstash Vector, which embeds text server-side), retrieves the items
//! closest to a question, and asks a chat model (Groq by default) to answer
//! from them.
//!
//! # Architecture
//!
//! - `config` - Settings (file + environment) and prompt templates
//! - `dataset` - Food record loading, validation and text enrichment
//! - `vector_store` - Vector store abstraction (Upstash, in-memory)
//! - `llm` - Chat-completion generators (OpenAI-compatible, Ollama)
//! - `retry` - Exponential backoff around remote calls
//! - `ingest` - Idempotent, batched dataset sync
//! - `rag` - Retrieval and answer generation
//! - `orchestrator` - Wires the pieces together from `Settings`
//!
//! # Example
//!
//! ```rust,no_run
//! use pantry::config::Settings;
//! use pantry::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     settings.validate()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     orchestrator.sync_dataset(false).await?;
//!     let response = orchestrator.respond("What are popular breakfast foods?").await;
//!     println!("{}", response.answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod http;
pub mod ingest;
pub mod llm;
pub mod orchestrator;
pub mod rag;
pub mod retry;
pub mod vector_store;

pub use error::{PantryError, Result};
