//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::ContextChunk;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Query, &settings)?;

    let top_k = settings.rag.top_k;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(query, top_k).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning(&format!(
                    "No results in namespace '{}'. Run 'pantry sync' to load the dataset.",
                    orchestrator.namespace()
                ));
            } else {
                Output::success(&format!("Found {} results", results.len()));
                for (i, result) in results.into_iter().enumerate() {
                    Output::source(i + 1, &ContextChunk::from(result));
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
