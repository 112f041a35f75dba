//! Idempotent dataset ingestion into a vector store namespace.
//!
//! A namespace that already holds vectors is left alone unless the sync is
//! forced. Batches are sent strictly one after another; a failed batch stops
//! the run and earlier batches stay in the store.

use crate::dataset::{to_vector_record, FoodRecord};
use crate::error::{PantryError, Result};
use crate::retry::RetryPolicy;
use crate::vector_store::{Namespace, NamespaceState, VectorRecord, VectorStore};
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default number of records per upsert call.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Largest batch the store accepts in one call.
pub const MAX_BATCH_SIZE: usize = 1000;
/// Default pause between batches.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// The namespace already had data.
    Skipped,
    /// Every record was uploaded and the count matches.
    Completed,
    /// Uploads went through but the store reports a different count.
    Incomplete,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Skipped => write!(f, "skipped"),
            SyncStatus::Completed => write!(f, "completed"),
            SyncStatus::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// Outcome of a sync run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub namespace: Namespace,
    pub status: SyncStatus,
    /// Vectors present before the run.
    pub existing_count: u64,
    pub uploaded: usize,
    pub batches: usize,
    /// Vectors present after the run (pending ones included).
    pub final_count: u64,
    pub expected_count: u64,
}

/// Pushes food records into a vector store.
pub struct Ingestor {
    store: Arc<dyn VectorStore>,
    retry: RetryPolicy,
    batch_size: usize,
    batch_pause: Duration,
    progress: Option<ProgressBar>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn VectorStore>, retry: RetryPolicy) -> Self {
        Self {
            store,
            retry,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
            progress: None,
        }
    }

    /// Records per batch, clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    /// Report per-record progress on `bar`.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Current state of `namespace`, retried like any other store call.
    pub async fn namespace_state(&self, namespace: &Namespace) -> Result<NamespaceState> {
        self.retry
            .run("namespace lookup", || {
                self.store.get_or_create_namespace_state(namespace)
            })
            .await
    }

    /// Upload `records` into `namespace` unless it already holds data.
    #[instrument(skip(self, records), fields(records = records.len(), namespace = %namespace))]
    pub async fn sync(
        &self,
        records: &[FoodRecord],
        namespace: &Namespace,
        force: bool,
    ) -> Result<SyncReport> {
        let state = self.namespace_state(namespace).await?;
        let existing_count = state.count();
        let expected_count = records.len() as u64;

        if existing_count > 0 && !force {
            info!(
                "Namespace {} already holds {} vectors, skipping upload",
                namespace, existing_count
            );
            return Ok(SyncReport {
                namespace: namespace.clone(),
                status: SyncStatus::Skipped,
                existing_count,
                uploaded: 0,
                batches: 0,
                final_count: existing_count,
                expected_count,
            });
        }

        if state == NamespaceState::NotYetCreated {
            debug!("Namespace {} will be created by the first upsert", namespace);
        }

        let vectors: Vec<VectorRecord> = records.iter().map(to_vector_record).collect();
        let total_batches = vectors.len().div_ceil(self.batch_size);
        info!(
            "Uploading {} records to {} in {} batches",
            vectors.len(),
            namespace,
            total_batches
        );

        if let Some(bar) = &self.progress {
            bar.set_length(vectors.len() as u64);
            bar.set_position(0);
        }

        let mut uploaded = 0;
        for (index, batch) in vectors.chunks(self.batch_size).enumerate() {
            let batch_number = index + 1;
            if index > 0 && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }

            let label = format!("upsert batch {}/{}", batch_number, total_batches);
            self.retry
                .run(&label, || self.store.upsert(batch, namespace))
                .await
                .map_err(|source| PantryError::SyncFailure {
                    batch: batch_number,
                    total_batches,
                    source: Box::new(source),
                })?;

            uploaded += batch.len();
            debug!("Batch {}/{} stored ({} records)", batch_number, total_batches, batch.len());
            if let Some(bar) = &self.progress {
                bar.inc(batch.len() as u64);
            }
        }

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }

        let final_count = self.namespace_state(namespace).await?.count();
        let status = if final_count == expected_count {
            SyncStatus::Completed
        } else {
            warn!(
                "Namespace {} holds {} vectors after sync, expected {}",
                namespace, final_count, expected_count
            );
            SyncStatus::Incomplete
        };

        Ok(SyncReport {
            namespace: namespace.clone(),
            status,
            existing_count,
            uploaded,
            batches: total_batches,
            final_count,
            expected_count,
        })
    }
}
