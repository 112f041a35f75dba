//! Sync command implementation.

use super::{interrupted, until_interrupted};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the sync command.
pub async fn run_sync(force: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Sync, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let records = orchestrator.load_dataset()?;
    Output::info(&format!(
        "Loaded {} records from {}",
        records.len(),
        orchestrator.settings().dataset_path().display()
    ));

    let ingestor = orchestrator
        .ingestor()
        .with_progress(Output::progress_bar(records.len() as u64, "Uploading"));

    let Some(result) =
        until_interrupted(orchestrator.sync_records(&ingestor, &records, force)).await
    else {
        interrupted();
        Output::info("Batches sent before the interrupt remain in the store.");
        return Ok(());
    };

    match result {
        Ok(report) => {
            Output::sync_report(&report);
            Output::kv("Namespace", &report.namespace.to_string());
            Output::kv("Vectors before", &report.existing_count.to_string());
            Output::kv("Vectors after", &report.final_count.to_string());
            Output::kv("Dataset records", &report.expected_count.to_string());
        }
        Err(e) => {
            Output::error(&format!("Sync failed: {}", e));
            Output::info("Batches sent before the failure remain in the store.");
            return Err(e.into());
        }
    }

    Ok(())
}
