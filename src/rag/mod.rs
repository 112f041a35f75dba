//! RAG (Retrieval-Augmented Generation) for food questions.
//!
//! Retrieval asks the vector store for the nearest food descriptions; the
//! answer engine turns them into a prompt, or into a templated summary when no
//! generator is configured.

pub mod context;
mod response;

pub use context::{format_context_for_display, format_context_for_prompt, Retriever};
pub use response::{Answer, AnswerEngine, AnswerKind};

use crate::vector_store::RetrievalResult;

/// A retrieved food description projected for prompting and display.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextChunk {
    /// Vector key (e.g. "food_12").
    pub key: String,
    pub score: f32,
    /// Unenriched description.
    pub text: String,
    pub region: String,
    pub food_type: String,
    pub cultural_significance: String,
}

impl ContextChunk {
    /// Whether the region or type carry more than their defaults.
    pub fn has_classification(&self) -> bool {
        self.region != "unknown" || self.food_type != "general"
    }
}

impl From<RetrievalResult> for ContextChunk {
    fn from(result: RetrievalResult) -> Self {
        Self {
            key: result.key,
            score: result.score,
            text: result.metadata.original_text.trim().to_string(),
            region: result.metadata.region,
            food_type: result.metadata.food_type,
            cultural_significance: result.metadata.cultural_significance,
        }
    }
}

#[cfg(test)]
pub(crate) fn chunk(key: &str, text: &str, score: f32) -> ContextChunk {
    ContextChunk {
        key: key.to_string(),
        score,
        text: text.to_string(),
        region: "unknown".to_string(),
        food_type: "general".to_string(),
        cultural_significance: String::new(),
    }
}
