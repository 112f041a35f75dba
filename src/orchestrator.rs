//! Pipeline orchestrator for Pantry.
//!
//! Wires the configured vector store, generator and prompts together and
//! exposes the sync / search / answer operations used by the CLI.

use crate::config::{Prompts, Settings};
use crate::dataset::{self, FoodRecord};
use crate::error::Result;
use crate::ingest::{Ingestor, SyncReport};
use crate::llm::{create_generator, Generator};
use crate::rag::{Answer, AnswerEngine, AnswerKind, ContextChunk, Retriever};
use crate::retry::RetryPolicy;
use crate::vector_store::{
    create_store, IndexInfo, Namespace, NamespaceState, RetrievalResult, VectorStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// An answer together with the sources it was built from.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub answer: Answer,
    pub sources: Vec<ContextChunk>,
}

/// The main orchestrator for the Pantry pipeline.
pub struct Orchestrator {
    settings: Settings,
    namespace: Namespace,
    store: Arc<dyn VectorStore>,
    retry: RetryPolicy,
    retriever: Retriever,
    engine: AnswerEngine,
}

impl Orchestrator {
    /// Create an orchestrator from validated settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let store = create_store(&settings)?;
        let generator = create_generator(&settings.generator, settings.request_timeout())?;
        match &generator {
            Some(g) => info!("Using {} generator ({})", g.name(), g.model()),
            None => info!("No generator configured, answers will be templated summaries"),
        }
        Self::with_components(settings, store, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn VectorStore>,
        generator: Option<Arc<dyn Generator>>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let retry = RetryPolicy::from_settings(&settings.retry);
        let engine = AnswerEngine::new(generator, retry)
            .with_prompts(prompts)
            .with_sampling(settings.generator.temperature, settings.generator.max_tokens)
            .with_context_metadata(settings.rag.include_metadata);

        Ok(Self {
            namespace: Namespace::new(settings.store.namespace.as_str()),
            retriever: Retriever::new(store.clone(), retry),
            store,
            retry,
            engine,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    pub fn has_generator(&self) -> bool {
        self.engine.has_generator()
    }

    /// An ingestor configured from settings.
    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(self.store.clone(), self.retry)
            .with_batch_size(self.settings.store.batch_size)
            .with_batch_pause(Duration::from_millis(self.settings.store.batch_pause_ms))
    }

    /// Load the configured dataset file.
    pub fn load_dataset(&self) -> Result<Vec<FoodRecord>> {
        dataset::load(&self.settings.dataset_path())
    }

    /// Load the dataset and sync it into the configured namespace.
    pub async fn sync_dataset(&self, force: bool) -> Result<SyncReport> {
        let records = self.load_dataset()?;
        self.sync_records(&self.ingestor(), &records, force).await
    }

    /// Sync `records` into the configured namespace using `ingestor`.
    pub async fn sync_records(
        &self,
        ingestor: &Ingestor,
        records: &[FoodRecord],
        force: bool,
    ) -> Result<SyncReport> {
        ingestor.sync(records, &self.namespace, force).await
    }

    /// Index statistics.
    pub async fn info(&self) -> Result<IndexInfo> {
        self.retry.run("index info", || self.store.info()).await
    }

    pub async fn namespace_state(&self) -> Result<NamespaceState> {
        self.ingestor().namespace_state(&self.namespace).await
    }

    /// Nearest food descriptions for `query`.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalResult>> {
        self.retriever.search(query, top_k, &self.namespace).await
    }

    /// Retrieve context and answer `question`.
    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<QueryResponse> {
        let sources = self
            .retriever
            .context(question, self.settings.rag.top_k, &self.namespace)
            .await?;
        let answer = self.engine.answer(question, &sources).await;
        Ok(QueryResponse { answer, sources })
    }

    /// Like [`ask`](Self::ask), but turns failures into an apology.
    pub async fn respond(&self, question: &str) -> QueryResponse {
        match self.ask(question).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Query failed: {}", e);
                QueryResponse {
                    answer: Answer {
                        text: format!(
                            "Sorry, I couldn't search the food database right now ({}). Please try again.",
                            e
                        ),
                        kind: AnswerKind::Degraded,
                        usage: None,
                    },
                    sources: Vec::new(),
                }
            }
        }
    }
}
