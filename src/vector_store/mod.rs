//! Vector store abstraction for Pantry.
//!
//! Stores embed text server-side: records are upserted as raw text and
//! queries are raw text too. No vectors are computed in this process.

mod memory;
mod upstash;

pub use memory::MemoryVectorStore;
pub use upstash::UpstashVectorStore;

use crate::config::{Settings, StoreProvider};
use crate::dataset::{FoodRecord, RecordId};
use crate::error::{PantryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A logical partition inside a shared index.
///
/// The empty name addresses the store's default partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    /// The store's default partition.
    pub fn default_partition() -> Self {
        Self(String::new())
    }

    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_default() {
            write!(f, "(default)")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Metadata stored next to each vector.
///
/// Parsed once at the store boundary; every field has a documented default so
/// downstream code never probes for absent keys. Fields fall back one at a
/// time: a null or oddly typed value never discards its siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodMetadata {
    #[serde(deserialize_with = "lenient::id")]
    pub id: Option<RecordId>,
    /// Defaults to "unknown".
    #[serde(deserialize_with = "lenient::region")]
    pub region: String,
    /// Defaults to "general".
    #[serde(rename = "type", deserialize_with = "lenient::food_type")]
    pub food_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub origin: String,
    #[serde(deserialize_with = "lenient::list")]
    pub ingredients: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub preparation: String,
    /// Free text; structured values are kept as compact JSON.
    #[serde(deserialize_with = "lenient::text")]
    pub nutrition: String,
    #[serde(deserialize_with = "lenient::text")]
    pub cultural_significance: String,
    #[serde(deserialize_with = "lenient::list")]
    pub dietary: Vec<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub allergens: Vec<String>,
    /// The record text before enrichment, shown verbatim in answers.
    #[serde(deserialize_with = "lenient::text")]
    pub original_text: String,
}

/// Per-field deserializers for metadata written by other tools.
mod lenient {
    use crate::dataset::RecordId;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_text(value: Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(Option::<Value>::deserialize(deserializer)?
            .map(value_to_text)
            .unwrap_or_default())
    }

    fn text_or<'de, D: Deserializer<'de>>(
        deserializer: D,
        default: &str,
    ) -> Result<String, D::Error> {
        let value = text(deserializer)?;
        if value.trim().is_empty() {
            Ok(default.to_string())
        } else {
            Ok(value)
        }
    }

    pub fn region<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        text_or(deserializer, "unknown")
    }

    pub fn food_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        text_or(deserializer, "general")
    }

    /// Arrays keep their non-empty items; a lone string becomes one item.
    pub fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let items = match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Array(items)) => items.into_iter().map(value_to_text).collect(),
            Some(Value::String(s)) => vec![s],
            _ => Vec::new(),
        };
        Ok(items.into_iter().filter(|s| !s.trim().is_empty()).collect())
    }

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RecordId>, D::Error> {
        Ok(Option::<Value>::deserialize(deserializer)?
            .and_then(|value| serde_json::from_value(value).ok()))
    }
}

impl Default for FoodMetadata {
    fn default() -> Self {
        Self {
            id: None,
            region: "unknown".to_string(),
            food_type: "general".to_string(),
            origin: String::new(),
            ingredients: Vec::new(),
            preparation: String::new(),
            nutrition: String::new(),
            cultural_significance: String::new(),
            dietary: Vec::new(),
            allergens: Vec::new(),
            original_text: String::new(),
        }
    }
}

impl From<&FoodRecord> for FoodMetadata {
    fn from(record: &FoodRecord) -> Self {
        let defaults = FoodMetadata::default();
        Self {
            id: Some(record.id.clone()),
            region: record.region.clone().unwrap_or(defaults.region),
            food_type: record.food_type.clone().unwrap_or(defaults.food_type),
            origin: record.origin.clone().unwrap_or_default(),
            ingredients: record.ingredients.clone(),
            preparation: record.preparation.clone().unwrap_or_default(),
            nutrition: record.nutrition.clone().unwrap_or_default(),
            cultural_significance: record.cultural_significance.clone().unwrap_or_default(),
            dietary: record.dietary.clone(),
            allergens: record.allergens.clone(),
            original_text: record.text.clone(),
        }
    }
}

/// The unit sent to the vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub key: String,
    /// Enriched text; embedded by the store.
    pub data: String,
    pub metadata: FoodMetadata,
}

/// One similarity match.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub key: String,
    /// Similarity score (higher is better).
    pub score: f32,
    pub metadata: FoodMetadata,
}

/// A raw-text similarity query.
#[derive(Debug, Clone)]
pub struct QueryRequest<'a> {
    pub text: &'a str,
    pub top_k: usize,
    pub include_metadata: bool,
    pub namespace: &'a Namespace,
}

/// Item counts for one namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamespaceInfo {
    pub vector_count: u64,
    /// Vectors accepted but not yet indexed.
    pub pending_vector_count: u64,
}

impl NamespaceInfo {
    /// Indexed plus pending vectors.
    pub fn total(&self) -> u64 {
        self.vector_count + self.pending_vector_count
    }
}

/// Index-wide statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexInfo {
    pub vector_count: u64,
    pub pending_vector_count: u64,
    pub dimension: u32,
    pub similarity_function: String,
    pub embedding_model: Option<String>,
    pub namespaces: BTreeMap<Namespace, NamespaceInfo>,
}

impl IndexInfo {
    /// State of `namespace` as seen in these statistics.
    pub fn namespace_state(&self, namespace: &Namespace) -> NamespaceState {
        match self.namespaces.get(namespace) {
            Some(info) => NamespaceState::Exists {
                count: info.total(),
            },
            None => NamespaceState::NotYetCreated,
        }
    }
}

/// Whether a namespace holds data yet. Lookup failures surface as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceState {
    Exists { count: u64 },
    /// Created implicitly by the first upsert into it.
    NotYetCreated,
}

impl NamespaceState {
    pub fn count(&self) -> u64 {
        match self {
            NamespaceState::Exists { count } => *count,
            NamespaceState::NotYetCreated => 0,
        }
    }
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Upsert one batch. The batch is atomic at the store; nothing spans batches.
    async fn upsert(&self, records: &[VectorRecord], namespace: &Namespace) -> Result<()>;

    /// Top-k matches for raw text, best first.
    async fn query(&self, request: &QueryRequest<'_>) -> Result<Vec<RetrievalResult>>;

    /// Index statistics.
    async fn info(&self) -> Result<IndexInfo>;

    /// Tri-state namespace probe: exists with a count, not yet created, or `Err`.
    async fn get_or_create_namespace_state(&self, namespace: &Namespace) -> Result<NamespaceState> {
        Ok(self.info().await?.namespace_state(namespace))
    }
}

/// Build the store selected in `settings`.
pub fn create_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.store.provider {
        StoreProvider::Upstash => {
            let url = settings.store.url.as_deref().ok_or_else(|| {
                PantryError::Config("UPSTASH_VECTOR_REST_URL is not set".to_string())
            })?;
            let token = settings.store.token.as_deref().ok_or_else(|| {
                PantryError::Config("UPSTASH_VECTOR_REST_TOKEN is not set".to_string())
            })?;
            Ok(Arc::new(UpstashVectorStore::new(
                url,
                token,
                settings.request_timeout(),
            )?))
        }
        StoreProvider::Memory => Ok(Arc::new(MemoryVectorStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_field_keeps_the_rest_of_the_metadata() {
        let metadata: FoodMetadata = serde_json::from_value(serde_json::json!({
            "id": 12,
            "region": null,
            "type": "Main",
            "original_text": "Pad Thai is a stir-fried noodle dish."
        }))
        .unwrap();

        assert_eq!(metadata.id, Some(RecordId::Int(12)));
        assert_eq!(metadata.region, "unknown");
        assert_eq!(metadata.food_type, "Main");
        assert_eq!(metadata.original_text, "Pad Thai is a stir-fried noodle dish.");
    }

    #[test]
    fn test_structured_nutrition_is_kept_as_text() {
        let metadata: FoodMetadata = serde_json::from_value(serde_json::json!({
            "nutrition": {"calories": 300},
            "ingredients": "rice",
            "dietary": ["vegan", null, ""],
            "allergens": 7,
            "original_text": "Dosa is a crepe."
        }))
        .unwrap();

        assert_eq!(metadata.nutrition, r#"{"calories":300}"#);
        assert_eq!(metadata.ingredients, vec!["rice"]);
        assert_eq!(metadata.dietary, vec!["vegan"]);
        assert!(metadata.allergens.is_empty());
        assert_eq!(metadata.original_text, "Dosa is a crepe.");
    }

    #[test]
    fn test_metadata_defaults_for_sparse_record() {
        let record = FoodRecord::new(3, "Croissant is a buttery pastry.");
        let metadata = FoodMetadata::from(&record);
        assert_eq!(metadata.region, "unknown");
        assert_eq!(metadata.food_type, "general");
        assert_eq!(metadata.origin, "");
        assert_eq!(metadata.original_text, "Croissant is a buttery pastry.");
    }

    #[test]
    fn test_metadata_parses_partial_json() {
        let metadata: FoodMetadata =
            serde_json::from_str(r#"{"original_text": "Tacos", "region": "Mexico"}"#).unwrap();
        assert_eq!(metadata.region, "Mexico");
        assert_eq!(metadata.food_type, "general");
        assert!(metadata.dietary.is_empty());
    }

    #[test]
    fn test_namespace_state_from_info() {
        let mut info = IndexInfo::default();
        info.namespaces.insert(
            Namespace::new("foods"),
            NamespaceInfo {
                vector_count: 40,
                pending_vector_count: 2,
            },
        );

        assert_eq!(
            info.namespace_state(&Namespace::new("foods")),
            NamespaceState::Exists { count: 42 }
        );
        assert_eq!(
            info.namespace_state(&Namespace::new("recipes")),
            NamespaceState::NotYetCreated
        );
        assert_eq!(NamespaceState::NotYetCreated.count(), 0);
    }

    #[test]
    fn test_namespace_display() {
        assert_eq!(Namespace::default_partition().to_string(), "(default)");
        assert_eq!(Namespace::new(" foods ").as_str(), "foods");
    }
}
