//! CLI command implementations.

mod ask;
mod config;
mod info;
mod search;
mod sync;
mod verify;

pub use ask::run_ask;
pub use config::run_config;
pub use info::run_info;
pub use search::run_search;
pub use sync::run_sync;
pub use verify::run_verify;

use crate::cli::Output;
use std::future::Future;

/// Run `task` unless Ctrl-C arrives first; `None` means interrupted.
pub(crate) async fn until_interrupted<F: Future>(task: F) -> Option<F::Output> {
    race_interrupt(task, ctrl_c()).await
}

async fn race_interrupt<F: Future, I: Future>(task: F, interrupt: I) -> Option<F::Output> {
    tokio::select! {
        output = task => Some(output),
        _ = interrupt => None,
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

pub(crate) fn interrupted() {
    println!();
    Output::info("Interrupted.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_interrupt_cancels_pending_work() {
        let output = race_interrupt(std::future::pending::<()>(), async {}).await;
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn test_finished_work_is_returned() {
        let output = race_interrupt(async { 42 }, std::future::pending::<()>()).await;
        assert_eq!(output, Some(42));
    }
}
