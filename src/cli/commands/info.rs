//! Info command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::vector_store::NamespaceState;
use anyhow::Result;

/// Run the info command.
pub async fn run_info(settings: Settings) -> Result<()> {
    preflight::check(Operation::Query, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Fetching index statistics...");
    let info = orchestrator.info().await;
    spinner.finish_and_clear();
    let info = info?;

    Output::header(&format!("Vector index ({})", orchestrator.store().name()));
    Output::kv("Vectors", &info.vector_count.to_string());
    Output::kv("Pending", &info.pending_vector_count.to_string());
    Output::kv("Dimension", &info.dimension.to_string());
    Output::kv("Similarity", &info.similarity_function);
    if let Some(model) = &info.embedding_model {
        Output::kv("Embedding model", model);
    }

    Output::header("Namespaces");
    for (namespace, counts) in &info.namespaces {
        Output::list_item(&format!(
            "{}: {} vectors ({} pending)",
            namespace, counts.vector_count, counts.pending_vector_count
        ));
    }

    println!();
    match info.namespace_state(orchestrator.namespace()) {
        NamespaceState::Exists { count } => Output::success(&format!(
            "Namespace '{}' holds {} vectors",
            orchestrator.namespace(),
            count
        )),
        NamespaceState::NotYetCreated => Output::warning(&format!(
            "Namespace '{}' does not exist yet. Run 'pantry sync' to create it.",
            orchestrator.namespace()
        )),
    }

    Ok(())
}
