//! Verify command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::dataset::{self, DatasetStats};
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the verify command.
pub async fn run_verify(settings: Settings) -> Result<()> {
    preflight::check(Operation::Verify, &settings)?;

    let path = settings.dataset_path();
    let records = dataset::load(&path)?;
    let stats = DatasetStats::from_records(&records);

    Output::header(&format!("Dataset {}", path.display()));
    Output::kv("Records", &stats.total.to_string());
    Output::kv("Average description", &format!("{:.1} words", stats.average_words));
    Output::kv("With region", &coverage(stats.with_region, stats.total));
    Output::kv("With type", &coverage(stats.with_type, stats.total));
    Output::kv("With ingredients", &coverage(stats.with_ingredients, stats.total));
    Output::kv(
        "With cultural significance",
        &coverage(stats.with_cultural_significance, stats.total),
    );
    Output::kv("With nutrition", &coverage(stats.with_nutrition, stats.total));

    print_set("Regions", &stats.regions);
    print_set("Types", &stats.types);
    print_set("Dietary", &stats.dietary);
    print_set("Allergens", &stats.allergens);

    // The store comparison is best effort; the dataset report stands alone.
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::warning(&format!("Skipping vector store check: {}", e));
        return Ok(());
    }
    let orchestrator = Orchestrator::new(settings)?;
    match orchestrator.namespace_state().await {
        Ok(state) if state.count() == stats.total as u64 => Output::success(&format!(
            "Namespace '{}' holds all {} records",
            orchestrator.namespace(),
            stats.total
        )),
        Ok(state) => Output::warning(&format!(
            "Namespace '{}' holds {} vectors but the dataset has {} records",
            orchestrator.namespace(),
            state.count(),
            stats.total
        )),
        Err(e) => Output::warning(&format!("Could not reach the vector store: {}", e)),
    }

    Ok(())
}

fn coverage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0".to_string();
    }
    format!("{} ({:.0}%)", count, count as f64 * 100.0 / total as f64)
}

fn print_set(label: &str, values: &std::collections::BTreeSet<String>) {
    if values.is_empty() {
        return;
    }
    Output::header(&format!("{} ({})", label, values.len()));
    for value in values {
        Output::list_item(value);
    }
}
