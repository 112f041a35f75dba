//! Upstash Vector REST client.
//!
//! The index embeds text server-side, so records go up as raw `data` and
//! queries are raw text. Every response is parsed once into a typed envelope.

use super::{
    FoodMetadata, IndexInfo, Namespace, NamespaceInfo, QueryRequest, RetrievalResult,
    VectorRecord, VectorStore,
};
use crate::error::{PantryError, Result};
use crate::http::{create_client, status_error, transport_error};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const SERVICE: &str = "upstash";

/// Upstash Vector store.
pub struct UpstashVectorStore {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

#[derive(Debug, Serialize)]
struct UpsertItem<'a> {
    id: &'a str,
    data: &'a str,
    metadata: &'a FoodMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    data: &'a str,
    top_k: usize,
    include_metadata: bool,
    include_vectors: bool,
}

/// `{"result": ...}` or `{"error": ..., "status": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InfoResult {
    vector_count: u64,
    pending_vector_count: u64,
    dimension: u32,
    similarity_function: String,
    dense_index: Option<DenseIndex>,
    namespaces: HashMap<String, NamespaceCounts>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DenseIndex {
    embedding_model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NamespaceCounts {
    vector_count: u64,
    pending_vector_count: u64,
}

impl From<InfoResult> for IndexInfo {
    fn from(info: InfoResult) -> Self {
        IndexInfo {
            vector_count: info.vector_count,
            pending_vector_count: info.pending_vector_count,
            dimension: info.dimension,
            similarity_function: info.similarity_function,
            embedding_model: info.dense_index.and_then(|d| d.embedding_model),
            namespaces: info
                .namespaces
                .into_iter()
                .map(|(name, counts)| {
                    (
                        Namespace::new(name),
                        NamespaceInfo {
                            vector_count: counts.vector_count,
                            pending_vector_count: counts.pending_vector_count,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl UpstashVectorStore {
    /// Create a client for the index at `url`.
    pub fn new(url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| PantryError::Config(format!("invalid Upstash URL '{}': {}", url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(PantryError::Config(format!(
                "invalid Upstash URL '{}': not an http(s) endpoint",
                url
            )));
        }
        if token.trim().is_empty() {
            return Err(PantryError::Config(
                "Upstash REST token is empty".to_string(),
            ));
        }

        Ok(Self {
            client: create_client(timeout)?,
            base_url: parsed,
            token: token.to_string(),
        })
    }

    /// `{base}/{action}[/{namespace}]`, each segment percent-encoded.
    fn endpoint(&self, action: &str, namespace: Option<&Namespace>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                PantryError::Config(format!("invalid Upstash URL '{}'", self.base_url))
            })?;
            segments.pop_if_empty().push(action);
            if let Some(namespace) = namespace.filter(|ns| !ns.is_default()) {
                segments.push(namespace.as_str());
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        let envelope: Option<Envelope<T>> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let message = envelope
                .and_then(|e| e.error)
                .unwrap_or_else(|| body.trim().to_string());
            return Err(status_error(SERVICE, status, message));
        }

        match envelope {
            Some(Envelope {
                result: Some(result),
                ..
            }) => Ok(result),
            Some(Envelope {
                error: Some(error), ..
            }) => Err(PantryError::remote(SERVICE, error)),
            _ => Err(PantryError::remote(
                SERVICE,
                format!("unexpected response: {}", truncate(&body, 200)),
            )),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn parse_metadata(key: &str, value: Option<serde_json::Value>) -> FoodMetadata {
    match value {
        None | Some(serde_json::Value::Null) => FoodMetadata::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Ignoring malformed metadata on {}: {}", key, e);
            FoodMetadata::default()
        }),
    }
}

#[async_trait]
impl VectorStore for UpstashVectorStore {
    fn name(&self) -> &str {
        SERVICE
    }

    #[instrument(skip(self, records), fields(count = records.len(), namespace = %namespace))]
    async fn upsert(&self, records: &[VectorRecord], namespace: &Namespace) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let items: Vec<UpsertItem<'_>> = records
            .iter()
            .map(|r| UpsertItem {
                id: &r.key,
                data: &r.data,
                metadata: &r.metadata,
            })
            .collect();

        let request = self
            .client
            .post(self.endpoint("upsert-data", Some(namespace))?)
            .json(&items);
        let _: serde_json::Value = self.send(request).await?;

        debug!("Upserted {} records", records.len());
        Ok(())
    }

    #[instrument(skip(self, request), fields(top_k = request.top_k, namespace = %request.namespace))]
    async fn query(&self, request: &QueryRequest<'_>) -> Result<Vec<RetrievalResult>> {
        let body = QueryBody {
            data: request.text,
            top_k: request.top_k,
            include_metadata: request.include_metadata,
            include_vectors: false,
        };

        let http_request = self
            .client
            .post(self.endpoint("query-data", Some(request.namespace))?)
            .json(&body);
        let matches: Vec<QueryMatch> = self.send(http_request).await?;

        debug!("Query returned {} matches", matches.len());
        Ok(matches
            .into_iter()
            .map(|m| RetrievalResult {
                metadata: parse_metadata(&m.id, m.metadata),
                key: m.id,
                score: m.score,
            })
            .collect())
    }

    async fn info(&self) -> Result<IndexInfo> {
        let request = self.client.get(self.endpoint("info", None)?);
        let info: InfoResult = self.send(request).await?;
        Ok(info.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureClass;
    use crate::vector_store::NamespaceState;
    use mockito::Matcher;

    fn store(server: &mockito::Server) -> UpstashVectorStore {
        UpstashVectorStore::new(&server.url(), "test-token", Duration::from_secs(5)).unwrap()
    }

    const INFO_BODY: &str = r#"{"result": {
        "vectorCount": 45, "pendingVectorCount": 0, "indexSize": 1024,
        "dimension": 1024, "similarityFunction": "COSINE",
        "denseIndex": {"dimension": 1024, "similarityFunction": "COSINE", "embeddingModel": "MXBAI_EMBED_LARGE_V1"},
        "namespaces": {"": {"vectorCount": 0, "pendingVectorCount": 0},
                       "foods": {"vectorCount": 40, "pendingVectorCount": 5}}
    }}"#;

    #[tokio::test]
    async fn test_info_parses_namespaces() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/info")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(INFO_BODY)
            .create_async()
            .await;

        let store = store(&server);
        let info = store.info().await.unwrap();

        mock.assert_async().await;
        assert_eq!(info.vector_count, 45);
        assert_eq!(info.dimension, 1024);
        assert_eq!(info.embedding_model.as_deref(), Some("MXBAI_EMBED_LARGE_V1"));
        assert_eq!(
            info.namespace_state(&Namespace::new("foods")),
            NamespaceState::Exists { count: 45 }
        );
        assert_eq!(
            info.namespace_state(&Namespace::default_partition()),
            NamespaceState::Exists { count: 0 }
        );
    }

    #[tokio::test]
    async fn test_namespace_state_not_yet_created() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/info")
            .with_status(200)
            .with_body(INFO_BODY)
            .create_async()
            .await;

        let state = store(&server)
            .get_or_create_namespace_state(&Namespace::new("recipes"))
            .await
            .unwrap();
        assert_eq!(state, NamespaceState::NotYetCreated);
    }

    #[tokio::test]
    async fn test_upsert_sends_namespaced_batch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upsert-data/foods")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"^\[\{"id":"food_1","data":"Tacos are folded tortillas\.""#.to_string()),
                Matcher::Regex(r#""original_text":"Tacos are folded tortillas\.""#.to_string()),
                Matcher::Regex(r#""region":"unknown""#.to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"result": "Success"}"#)
            .create_async()
            .await;

        let record = VectorRecord {
            key: "food_1".to_string(),
            data: "Tacos are folded tortillas.".to_string(),
            metadata: FoodMetadata {
                original_text: "Tacos are folded tortillas.".to_string(),
                ..Default::default()
            },
        };
        store(&server)
            .upsert(&[record], &Namespace::new("foods"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_preserves_store_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/query-data/foods")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "data": "breakfast food", "topK": 2, "includeMetadata": true
            })))
            .with_status(200)
            .with_body(
                r#"{"result": [
                    {"id": "food_1", "score": 0.91, "metadata": {"id": 1, "region": "USA", "original_text": "Pancakes"}},
                    {"id": "food_3", "score": 0.72, "metadata": {"id": 3, "original_text": "Croissant"}}
                ]}"#,
            )
            .create_async()
            .await;

        let foods = Namespace::new("foods");
        let results = store(&server)
            .query(&QueryRequest {
                text: "breakfast food",
                top_k: 2,
                include_metadata: true,
                namespace: &foods,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].key, "food_1");
        assert_eq!(results[0].metadata.region, "USA");
        assert_eq!(results[1].metadata.region, "unknown");
        assert_eq!(results[1].metadata.original_text, "Croissant");
    }

    #[tokio::test]
    async fn test_default_namespace_uses_bare_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/query-data")
            .with_status(200)
            .with_body(r#"{"result": []}"#)
            .create_async()
            .await;

        let default = Namespace::default_partition();
        let results = store(&server)
            .query(&QueryRequest {
                text: "soup",
                top_k: 3,
                include_metadata: true,
                namespace: &default,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/info")
            .with_status(401)
            .with_body(r#"{"error": "Unauthorized: Invalid auth token", "status": 401}"#)
            .create_async()
            .await;

        let err = store(&server).info().await.unwrap_err();
        assert_eq!(err.failure_class(), FailureClass::AuthenticationFailed);
        assert!(err.to_string().contains("Invalid auth token"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_retryable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/info")
            .with_status(429)
            .with_body("Too many requests")
            .create_async()
            .await;

        let err = store(&server).info().await.unwrap_err();
        assert_eq!(err.failure_class(), FailureClass::RateLimited);
    }

    #[tokio::test]
    async fn test_malformed_body_is_remote_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/info")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let err = store(&server).info().await.unwrap_err();
        assert_eq!(err.failure_class(), FailureClass::Other);
    }

    #[test]
    fn test_rejects_bad_url_and_empty_token() {
        assert!(matches!(
            UpstashVectorStore::new("not a url", "t", Duration::from_secs(1)),
            Err(PantryError::Config(_))
        ));
        assert!(matches!(
            UpstashVectorStore::new("https://example.upstash.io", " ", Duration::from_secs(1)),
            Err(PantryError::Config(_))
        ));
    }

    #[test]
    fn test_namespace_is_a_single_encoded_segment() {
        let store =
            UpstashVectorStore::new("https://example.upstash.io/", "t", Duration::from_secs(1))
                .unwrap();

        let url = store
            .endpoint("query-data", Some(&Namespace::new("street food/asia?v=2")))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.upstash.io/query-data/street%20food%2Fasia%3Fv=2"
        );
        assert_eq!(url.query(), None);

        let url = store.endpoint("info", None).unwrap();
        assert_eq!(url.as_str(), "https://example.upstash.io/info");
    }

    #[tokio::test]
    async fn test_null_metadata_field_keeps_original_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/query-data/foods")
            .with_status(200)
            .with_body(
                r#"{"result": [
                    {"id": "food_12", "score": 0.88, "metadata": {"id": 12, "region": null, "original_text": "Pad Thai is a noodle dish."}},
                    {"id": "food_2", "score": 0.61, "metadata": {"id": 2, "nutrition": {"calories": 300}, "original_text": "Dosa is a crepe."}}
                ]}"#,
            )
            .create_async()
            .await;

        let foods = Namespace::new("foods");
        let results = store(&server)
            .query(&QueryRequest {
                text: "noodles",
                top_k: 2,
                include_metadata: true,
                namespace: &foods,
            })
            .await
            .unwrap();

        assert_eq!(results[0].metadata.region, "unknown");
        assert_eq!(results[0].metadata.original_text, "Pad Thai is a noodle dish.");
        assert_eq!(results[1].metadata.nutrition, r#"{"calories":300}"#);
        assert_eq!(results[1].metadata.original_text, "Dosa is a crepe.");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("crème brûlée", 4), "crèm...");
        assert_eq!(truncate("short", 10), "short");
    }
}
