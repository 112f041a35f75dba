//! Local Ollama chat endpoint.

use super::{Completion, CompletionRequest, Generator, TokenUsage};
use crate::error::{PantryError, Result};
use crate::http::{create_client, status_error, transport_error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;
use url::Url;

const SERVICE: &str = "ollama";

pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl OllamaGenerator {
    pub fn new(host: &str, model: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(host)
            .map_err(|e| PantryError::Config(format!("invalid Ollama host '{}': {}", host, e)))?;

        Ok(Self {
            client: create_client(timeout)?,
            endpoint: format!("{}/api/chat", base.as_str().trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn name(&self) -> &str {
        SERVICE
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = ChatBody {
            model: &self.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: Options {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(status_error(SERVICE, status, message));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| PantryError::remote(SERVICE, format!("malformed response: {}", e)))?;

        let content = parsed
            .message
            .map(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| PantryError::remote(SERVICE, "empty response from model"))?;

        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (None, None) => None,
            (input, output) => Some(TokenUsage {
                input: input.unwrap_or(0),
                output: output.unwrap_or(0),
            }),
        };

        Ok(Completion {
            text: content,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureClass;
    use crate::llm::ChatMessage;
    use mockito::Matcher;

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::user("What is paella?")],
            temperature: 0.7,
            max_tokens: 500,
        }
    }

    #[tokio::test]
    async fn test_ollama_chat() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "llama3.2",
                "stream": false,
                "options": {"num_predict": 500}
            })))
            .with_status(200)
            .with_body(
                r#"{"model": "llama3.2", "message": {"role": "assistant", "content": "Paella is a Valencian rice dish."},
                    "done": true, "prompt_eval_count": 42, "eval_count": 9}"#,
            )
            .create_async()
            .await;

        let generator =
            OllamaGenerator::new(&server.url(), "llama3.2", Duration::from_secs(5)).unwrap();
        let completion = generator.complete(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.text, "Paella is a Valencian rice dish.");
        assert_eq!(
            completion.usage,
            Some(TokenUsage {
                input: 42,
                output: 9
            })
        );
    }

    #[tokio::test]
    async fn test_missing_model_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(404)
            .with_body(r#"{"error": "model 'llama3.2' not found"}"#)
            .create_async()
            .await;

        let generator =
            OllamaGenerator::new(&server.url(), "llama3.2", Duration::from_secs(5)).unwrap();
        let err = generator.complete(&request()).await.unwrap_err();

        assert_eq!(err.failure_class(), FailureClass::Other);
        assert!(err.to_string().contains("not found"));
    }
}
