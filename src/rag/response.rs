//! Answer generation.

use super::context::{format_context_for_prompt, preview};
use super::ContextChunk;
use crate::config::{GeneratorSettings, Prompts};
use crate::llm::{ChatMessage, CompletionRequest, Generator, TokenUsage};
use crate::retry::RetryPolicy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Reply when retrieval found nothing usable.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find any relevant information about that. \
     Could you try asking about a specific type of food or cuisine?";

/// Characters of each source quoted in a templated summary.
const SUMMARY_PREVIEW_CHARS: usize = 150;
/// Characters of the top source quoted when the generator fails.
const DEGRADED_PREVIEW_CHARS: usize = 200;

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// Written by the generator.
    Generated,
    /// Templated summary; no generator configured.
    Summary,
    /// Retrieval returned nothing usable.
    NoContext,
    /// The generator failed; built from the top source instead.
    Degraded,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
    /// Token counters from the generator, when reported.
    pub usage: Option<TokenUsage>,
}

impl Answer {
    fn new(text: String, kind: AnswerKind) -> Self {
        Self {
            text,
            kind,
            usage: None,
        }
    }
}

/// Turns retrieved context into an answer.
pub struct AnswerEngine {
    generator: Option<Arc<dyn Generator>>,
    prompts: Prompts,
    retry: RetryPolicy,
    temperature: f32,
    max_tokens: u32,
    include_metadata: bool,
}

impl AnswerEngine {
    /// Create an engine. `None` produces templated summaries.
    pub fn new(generator: Option<Arc<dyn Generator>>, retry: RetryPolicy) -> Self {
        let defaults = GeneratorSettings::default();
        Self {
            generator,
            prompts: Prompts::default(),
            retry,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            include_metadata: true,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Whether context entries carry region/type and cultural lines.
    pub fn with_context_metadata(mut self, include_metadata: bool) -> Self {
        self.include_metadata = include_metadata;
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// The two-message prompt for `question` over `context`.
    pub fn build_request(&self, question: &str, context: &str) -> CompletionRequest {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context.to_string());

        let system = self.prompts.render_with_custom(&self.prompts.rag.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        CompletionRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Answer `question` from `contexts`. Never fails: remote errors degrade
    /// to an answer quoting the best match.
    #[instrument(skip(self, contexts), fields(contexts = contexts.len()))]
    pub async fn answer(&self, question: &str, contexts: &[ContextChunk]) -> Answer {
        let usable: Vec<&ContextChunk> = contexts.iter().filter(|c| !c.text.is_empty()).collect();
        if usable.is_empty() {
            return Answer::new(NO_CONTEXT_ANSWER.to_string(), AnswerKind::NoContext);
        }

        let Some(generator) = &self.generator else {
            return Answer::new(templated_summary(&usable), AnswerKind::Summary);
        };

        let context = format_context_for_prompt(contexts, self.include_metadata);
        let request = self.build_request(question, &context);

        match self
            .retry
            .run("chat completion", || generator.complete(&request))
            .await
        {
            Ok(completion) => {
                if let Some(usage) = completion.usage {
                    info!(
                        "{} usage - input: {} tokens, output: {} tokens",
                        generator.name(),
                        usage.input,
                        usage.output
                    );
                }
                Answer {
                    text: completion.text.trim().to_string(),
                    kind: AnswerKind::Generated,
                    usage: completion.usage,
                }
            }
            Err(e) => {
                warn!("Generation failed, answering from retrieved text: {}", e);
                Answer::new(
                    format!(
                        "Based on the available information: {}",
                        preview(&usable[0].text, DEGRADED_PREVIEW_CHARS)
                    ),
                    AnswerKind::Degraded,
                )
            }
        }
    }
}

/// Bullet list quoting the start of each retrieved description.
fn templated_summary(contexts: &[&ContextChunk]) -> String {
    let bullets = contexts
        .iter()
        .map(|c| format!("• {}", preview(&c.text, SUMMARY_PREVIEW_CHARS)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on the retrieved information, here are some relevant food items related to your query:\n\n{}",
        bullets
    )
}
