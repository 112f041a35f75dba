//! OpenAI-compatible chat completions (Groq by default).

use super::{ChatMessage, Completion, CompletionRequest, Generator, Role, TokenUsage};
use crate::error::{PantryError, Result};
use crate::http::{create_client, transport_error};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::{debug, instrument};

/// Generator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    service: String,
}

impl OpenAiGenerator {
    pub fn new(api_base: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let config = OpenAIConfig::new()
            .with_api_base(api_base.trim_end_matches('/'))
            .with_api_key(api_key);

        // Retries are handled by `RetryPolicy`; the client gives up after one attempt.
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        let client = Client::with_config(config)
            .with_http_client(create_client(timeout)?)
            .with_backoff(no_retry);

        let service = if api_base.contains("groq") {
            "groq"
        } else {
            "openai"
        };

        Ok(Self {
            client,
            model: model.to_string(),
            service: service.to_string(),
        })
    }

    fn build_messages(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages
            .iter()
            .map(|message| {
                let built: ChatCompletionRequestMessage = match message.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(message.content.clone())
                        .build()
                        .map_err(invalid_request)?
                        .into(),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(message.content.clone())
                        .build()
                        .map_err(invalid_request)?
                        .into(),
                    Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(message.content.clone())
                        .build()
                        .map_err(invalid_request)?
                        .into(),
                };
                Ok(built)
            })
            .collect()
    }

    fn classify(&self, err: OpenAIError) -> PantryError {
        classify_error(&self.service, err)
    }
}

fn invalid_request(err: OpenAIError) -> PantryError {
    PantryError::InvalidInput(err.to_string())
}

/// Map client errors onto the retry taxonomy.
///
/// The client drops HTTP status codes, so API errors are told apart by their
/// `code`/`type` fields. Server errors arrive without either.
fn classify_error(service: &str, err: OpenAIError) -> PantryError {
    match err {
        OpenAIError::Reqwest(e) => transport_error(service, &e),
        OpenAIError::ApiError(api) => {
            let code = api.code.as_deref().unwrap_or_default().to_lowercase();
            let kind = api.r#type.as_deref().unwrap_or_default().to_lowercase();
            let message = api.message.to_lowercase();

            if code.contains("rate_limit") || kind == "tokens" || message.contains("rate limit") {
                PantryError::rate_limited(service, api.message)
            } else if code == "invalid_api_key"
                || kind.contains("authentication")
                || message.contains("invalid api key")
                || message.contains("unauthorized")
            {
                PantryError::auth(service, api.message)
            } else if api.code.is_none() && api.r#type.is_none() && api.param.is_none() {
                PantryError::transient(service, api.message)
            } else {
                PantryError::remote(service, api.message)
            }
        }
        OpenAIError::JSONDeserialize(e) => {
            PantryError::remote(service, format!("malformed response: {}", e))
        }
        other => PantryError::remote(service, other.to_string()),
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        &self.service
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::build_messages(&request.messages)?)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens)
            .build()
            .map_err(invalid_request)?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| self.classify(e))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PantryError::remote(&self.service, "empty response from model"))?;

        let usage = response.usage.map(|u| TokenUsage {
            input: u.prompt_tokens,
            output: u.completion_tokens,
        });
        debug!("Completion received ({} chars)", text.len());

        Ok(Completion { text, usage })
    }
}
