//! Ask command implementation: one-shot question or interactive session.

use super::{interrupted, until_interrupted};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;
use tracing::info;

/// Run the ask command.
pub async fn run_ask(question: Option<String>, sync: bool, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'pantry config show' to inspect the effective configuration.");
        return Err(e.into());
    }

    let generator = preflight::generator_summary(&settings);
    let orchestrator = Orchestrator::new(settings)?;

    if sync {
        match until_interrupted(ensure_synced(&orchestrator)).await {
            Some(result) => result?,
            None => {
                interrupted();
                return Ok(());
            }
        }
    }

    match question {
        Some(question) => {
            if until_interrupted(answer(&orchestrator, &question)).await.is_none() {
                interrupted();
            }
        }
        None => run_interactive(&orchestrator, &generator).await?,
    }

    Ok(())
}



/// Load the dataset if the namespace is still empty.
async fn ensure_synced(orchestrator: &Orchestrator) -> Result<()> {
    let spinner = Output::spinner("Checking vector store...");
    let state = orchestrator.namespace_state().await;
    spinner.finish_and_clear();

    let count = state?.count();
    if count > 0 {
        info!(
            "Namespace {} holds {} vectors, skipping sync",
            orchestrator.namespace(),
            count
        );
        return Ok(());
    }

    Output::info(&format!(
        "Namespace '{}' is empty, loading {}",
        orchestrator.namespace(),
        orchestrator.settings().dataset_path().display()
    ));
    let records = orchestrator.load_dataset()?;
    let ingestor = orchestrator
        .ingestor()
        .with_progress(Output::progress_bar(records.len() as u64, "Uploading"));
    let report = orchestrator.sync_records(&ingestor, &records, false).await?;
    Output::sync_report(&report);

    Ok(())
}

/// Answer one question and print sources and answer.
async fn answer(orchestrator: &Orchestrator, question: &str) {
    let spinner = Output::spinner("Searching food database...");
    let response = orchestrator.respond(question).await;
    spinner.finish_and_clear();

    for (i, source) in response.sources.iter().enumerate() {
        Output::source(i + 1, source);
    }
    Output::answer(&response.answer.text);
}

async fn run_interactive(orchestrator: &Orchestrator, generator: &str) -> Result<()> {
    println!("\n{}", style("Pantry - food assistant").bold().cyan());
    println!(
        "{}",
        style(format!(
            "Namespace: {}  Generator: {}",
            orchestrator.namespace(),
            generator
        ))
        .dim()
    );
    println!(
        "{}\n",
        style("Ask about dishes, ingredients or culinary traditions. Type 'exit' to quit.").dim()
    );

    let mut lines = spawn_line_reader();

    loop {
        print!("{} ", style("You:").green().bold());
        io::stdout().flush()?;

        // End of input or Ctrl-C.
        let Some(line) = until_interrupted(lines.recv()).await.flatten() else {
            println!();
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            Output::warning("Please ask a question about food.");
            continue;
        }
        if is_exit_command(input) {
            break;
        }

        if until_interrupted(answer(orchestrator, input)).await.is_none() {
            println!();
            break;
        }
    }

    Output::info("Goodbye!");
    Ok(())
}

/// Read stdin lines on a dedicated thread; the channel closes at end of input.
fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn is_exit_command(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "exit" | "quit" | "bye")
}
