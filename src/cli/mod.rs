//! CLI module for Pantry.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::Settings;
use clap::{Parser, Subcommand};

/// Pantry - ask questions about a curated food dataset
///
/// Without a subcommand, answers the question given as arguments, or starts
/// an interactive session when no question is given.
#[derive(Parser, Debug)]
#[command(name = "pantry")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Vector store namespace (overrides FOODS_NAMESPACE)
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Path to the food dataset JSON file (overrides JSON_FILE)
    #[arg(long, global = true)]
    pub dataset: Option<String>,

    /// Number of matches to retrieve (overrides MAX_RESULTS)
    #[arg(short = 'k', long, global = true)]
    pub top_k: Option<usize>,

    /// Skip the dataset sync before answering
    #[arg(long)]
    pub no_sync: bool,

    /// Question to answer; omit for an interactive session.
    ///
    /// Quote questions whose first word is a subcommand name,
    /// e.g. pantry "info on sushi".
    pub question: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply command-line overrides on top of file and environment settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(namespace) = &self.namespace {
            settings.store.namespace = namespace.trim().to_string();
        }
        if let Some(dataset) = &self.dataset {
            settings.dataset.path = dataset.clone();
        }
        if let Some(top_k) = self.top_k {
            settings.rag.top_k = top_k;
        }
    }

    /// The positional question, or `None` for interactive mode.
    pub fn question(&self) -> Option<String> {
        let question = self.question.join(" ");
        let question = question.trim();
        if question.is_empty() {
            None
        } else {
            Some(question.to_string())
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the dataset into the vector store (skipped if the namespace has data)
    Sync {
        /// Upload even if the namespace already holds vectors
        #[arg(short, long)]
        force: bool,
    },

    /// Show the closest food descriptions for a query
    Search {
        /// Search query
        query: String,
    },

    /// Show vector index statistics
    Info,

    /// Check the dataset file and compare it with the vector store
    Verify,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_question() {
        let cli = Cli::parse_from(["pantry", "what", "is", "dosa?"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.question().as_deref(), Some("what is dosa?"));
    }

    #[test]
    fn test_no_question_is_interactive() {
        let cli = Cli::parse_from(["pantry", "--no-sync"]);
        assert!(cli.question().is_none());
        assert!(cli.no_sync);
    }

    #[test]
    fn test_subcommand_with_global_flags() {
        let cli = Cli::parse_from(["pantry", "search", "rice", "-k", "5", "--namespace", "recipes"]);
        match &cli.command {
            Some(Commands::Search { query }) => assert_eq!(query, "rice"),
            other => panic!("unexpected command: {:?}", other),
        }

        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.rag.top_k, 5);
        assert_eq!(settings.store.namespace, "recipes");
    }

    #[test]
    fn test_leading_subcommand_word_needs_quoting() {
        assert!(Cli::try_parse_from(["pantry", "info", "on", "sushi"]).is_err());

        let cli = Cli::parse_from(["pantry", "info on sushi"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.question().as_deref(), Some("info on sushi"));
    }

    #[test]
    fn test_sync_force() {
        let cli = Cli::parse_from(["pantry", "sync", "--force"]);
        assert!(matches!(cli.command, Some(Commands::Sync { force: true })));
    }
}
