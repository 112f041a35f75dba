//! Chat-completion generators.

mod ollama;
mod openai;

pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

use crate::config::{GeneratorProvider, GeneratorSettings};
use crate::error::{PantryError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One non-streaming completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token counters reported by the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// A chat-completion backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Build the generator selected in `settings`, or `None` for templated answers.
pub fn create_generator(
    settings: &GeneratorSettings,
    timeout: Duration,
) -> Result<Option<Arc<dyn Generator>>> {
    match settings.effective_provider() {
        GeneratorProvider::Groq => {
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                PantryError::Config("GROQ_API_KEY is required for the groq provider".to_string())
            })?;
            Ok(Some(Arc::new(OpenAiGenerator::new(
                &settings.api_base,
                api_key,
                &settings.model,
                timeout,
            )?)))
        }
        GeneratorProvider::Ollama => Ok(Some(Arc::new(OllamaGenerator::new(
            &settings.ollama_host,
            &settings.ollama_model,
            timeout,
        )?))),
        GeneratorProvider::None | GeneratorProvider::Auto => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_without_key_has_no_generator() {
        let settings = GeneratorSettings {
            api_key: None,
            ..Default::default()
        };
        let generator = create_generator(&settings, Duration::from_secs(5)).unwrap();
        assert!(generator.is_none());
    }

    #[test]
    fn test_auto_with_key_uses_groq() {
        let settings = GeneratorSettings {
            api_key: Some("gsk_test".to_string()),
            ..Default::default()
        };
        let generator = create_generator(&settings, Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert_eq!(generator.name(), "groq");
        assert_eq!(generator.model(), "llama-3.1-8b-instant");
    }

    #[test]
    fn test_explicit_groq_without_key_fails() {
        let settings = GeneratorSettings {
            provider: GeneratorProvider::Groq,
            api_key: None,
            ..Default::default()
        };
        assert!(matches!(
            create_generator(&settings, Duration::from_secs(5)),
            Err(PantryError::Config(_))
        ));
    }

    #[test]
    fn test_ollama_provider() {
        let settings = GeneratorSettings {
            provider: GeneratorProvider::Ollama,
            ..Default::default()
        };
        let generator = create_generator(&settings, Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert_eq!(generator.name(), "ollama");
    }
}
