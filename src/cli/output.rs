//! CLI output formatting utilities.

use crate::ingest::{SyncReport, SyncStatus};
use crate::rag::context::preview;
use crate::rag::ContextChunk;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one retrieved source.
    pub fn source(rank: usize, chunk: &ContextChunk) {
        println!(
            "\n{} {} {} ({} / {}, score: {:.3})",
            style(">>").green(),
            style(format!("Source {}", rank)).bold(),
            style(&chunk.key).dim(),
            style(&chunk.region).cyan(),
            chunk.food_type,
            chunk.score
        );
        println!("   \"{}\"", preview(&chunk.text, 200));
    }

    /// Print an answer.
    pub fn answer(text: &str) {
        println!("\n{} {}\n", style("Pantry:").cyan().bold(), text);
    }

    /// Print a sync report.
    pub fn sync_report(report: &SyncReport) {
        match report.status {
            SyncStatus::Skipped => Output::info(&format!(
                "Namespace '{}' already holds {} vectors, nothing uploaded",
                report.namespace, report.existing_count
            )),
            SyncStatus::Completed => Output::success(&format!(
                "Uploaded {} records to '{}' in {} batches",
                report.uploaded, report.namespace, report.batches
            )),
            SyncStatus::Incomplete => Output::warning(&format!(
                "Uploaded {} records to '{}' but the store reports {} vectors (expected {}). \
                 Indexing may still be in progress.",
                report.uploaded, report.namespace, report.final_count, report.expected_count
            )),
        }
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
