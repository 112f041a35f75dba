//! Retrieval and context formatting.

use super::ContextChunk;
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::vector_store::{Namespace, QueryRequest, RetrievalResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Longest description shown per source in diagnostics.
const DISPLAY_PREVIEW_CHARS: usize = 200;

/// Raw-text similarity search against a vector store.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    retry: RetryPolicy,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Top `top_k` matches for `query` in `namespace`, in store order.
    ///
    /// A blank query or a `top_k` of zero yields no results without calling the store.
    #[instrument(skip(self), fields(namespace = %namespace))]
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        namespace: &Namespace,
    ) -> Result<Vec<RetrievalResult>> {
        let query = query.trim();
        if query.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let request = QueryRequest {
            text: query,
            top_k,
            include_metadata: true,
            namespace,
        };
        let results = self
            .retry
            .run("vector query", || self.store.query(&request))
            .await?;

        debug!("Retrieved {} results", results.len());
        Ok(results)
    }

    /// Search and project the results into context chunks.
    pub async fn context(
        &self,
        query: &str,
        top_k: usize,
        namespace: &Namespace,
    ) -> Result<Vec<ContextChunk>> {
        let results = self.search(query, top_k, namespace).await?;
        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Build the context block sent to the generator.
///
/// One paragraph per chunk, in retrieval order, separated by blank lines.
/// With `include_metadata`, region/type and cultural significance lines
/// follow each description.
pub fn format_context_for_prompt(chunks: &[ContextChunk], include_metadata: bool) -> String {
    chunks
        .iter()
        .filter(|chunk| !chunk.text.is_empty())
        .map(|chunk| {
            let mut block = chunk.text.clone();
            if !include_metadata {
                return block;
            }
            if chunk.has_classification() {
                block.push_str(&format!(
                    "\nRegion: {} | Type: {}",
                    chunk.region, chunk.food_type
                ));
            }
            if !chunk.cultural_significance.trim().is_empty() {
                block.push_str(&format!(
                    "\nCultural significance: {}",
                    chunk.cultural_significance.trim()
                ));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format chunks as numbered sources for the terminal.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "Source {} (ID: {}, Region: {}, Type: {}, Score: {:.3}):\n    \"{}\"",
                i + 1,
                chunk.key,
                chunk.region,
                chunk.food_type,
                chunk.score,
                preview(&chunk.text, DISPLAY_PREVIEW_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let text = text.replace('\n', " ");
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}
