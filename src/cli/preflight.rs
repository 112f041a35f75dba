//! Pre-flight checks before talking to remote services.
//!
//! Validates configuration up front so missing credentials fail at startup
//! instead of midway through a sync.

use crate::config::{GeneratorProvider, Settings};
use crate::error::{PantryError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions needs the store. The dataset is loaded only if the
    /// namespace turns out to be empty.
    Ask,
    /// Syncing needs the store and the dataset.
    Sync,
    /// Search and info only need the store.
    Query,
    /// Verify needs the dataset file.
    Verify,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask | Operation::Sync | Operation::Query => settings.validate()?,
        Operation::Verify => {}
    }
    match operation {
        Operation::Sync | Operation::Verify => check_dataset(settings)?,
        Operation::Ask | Operation::Query => {}
    }
    Ok(())
}

/// Human-readable summary of the answer mode, for startup banners.
pub fn generator_summary(settings: &Settings) -> String {
    match settings.generator.effective_provider() {
        GeneratorProvider::Groq => {
            format!("{} via {}", settings.generator.model, settings.generator.api_base)
        }
        GeneratorProvider::Ollama => format!(
            "{} via Ollama at {}",
            settings.generator.ollama_model, settings.generator.ollama_host
        ),
        GeneratorProvider::None | GeneratorProvider::Auto => {
            "none (set GROQ_API_KEY for generated answers)".to_string()
        }
    }
}

/// Check that the dataset file exists.
fn check_dataset(settings: &Settings) -> Result<()> {
    let path = settings.dataset_path();
    if path.is_file() {
        Ok(())
    } else {
        Err(PantryError::Config(format!(
            "Dataset file not found: {}. Set JSON_FILE or pass --dataset.",
            path.display()
        )))
    }
}
