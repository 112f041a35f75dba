//! Food dataset loading and text enrichment.
//!
//! The dataset is a flat JSON array of food records. It is the single source
//! of truth for (re-)ingestion; nothing is written back to it.

mod enrich;
mod stats;

pub use enrich::{prepare_enriched_text, to_vector_record, vector_key};
pub use stats::DatasetStats;

use crate::error::{PantryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Record identifier as it appears in the dataset: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<i32> for RecordId {
    fn from(n: i32) -> Self {
        RecordId::Int(i64::from(n))
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_string())
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub id: RecordId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub food_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub dietary: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_significance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<String>,
}

impl FoodRecord {
    /// Create a record with only the required fields.
    pub fn new(id: impl Into<RecordId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            region: None,
            food_type: None,
            origin: None,
            ingredients: Vec::new(),
            dietary: Vec::new(),
            allergens: Vec::new(),
            cultural_significance: None,
            preparation: None,
            nutrition: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_type(mut self, food_type: impl Into<String>) -> Self {
        self.food_type = Some(food_type.into());
        self
    }
}

/// Wire shape of a record before the required fields are checked.
#[derive(Debug, Deserialize)]
struct RawFoodRecord {
    id: Option<RecordId>,
    text: Option<String>,
    region: Option<String>,
    #[serde(rename = "type")]
    food_type: Option<String>,
    origin: Option<String>,
    #[serde(default)]
    ingredients: Option<Vec<String>>,
    #[serde(default)]
    dietary: Option<Vec<String>>,
    #[serde(default)]
    allergens: Option<Vec<String>>,
    cultural_significance: Option<String>,
    preparation: Option<String>,
    nutrition: Option<serde_json::Value>,
}

impl RawFoodRecord {
    fn validate(self, index: usize) -> Result<FoodRecord> {
        let id = self.id.ok_or_else(|| {
            PantryError::DataFormat(format!("record #{} is missing required field `id`", index + 1))
        })?;
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                PantryError::DataFormat(format!(
                    "record #{} (id {}) is missing required field `text`",
                    index + 1,
                    id
                ))
            })?;

        // Nutrition is free text, but some datasets carry it as an object.
        let nutrition = self.nutrition.and_then(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

        Ok(FoodRecord {
            id,
            text,
            region: self.region,
            food_type: self.food_type,
            origin: self.origin,
            ingredients: self.ingredients.unwrap_or_default(),
            dietary: self.dietary.unwrap_or_default(),
            allergens: self.allergens.unwrap_or_default(),
            cultural_significance: self.cultural_significance,
            preparation: self.preparation,
            nutrition,
        })
    }
}

/// Load and validate the dataset at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Vec<FoodRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PantryError::DataFormat(format!("cannot read dataset {}: {}", path.display(), e))
    })?;

    let records = parse(&content)
        .map_err(|e| PantryError::DataFormat(format!("{}: {}", path.display(), strip_prefix(e))))?;

    info!("Loaded {} food records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse and validate a dataset held in memory.
pub fn parse(content: &str) -> Result<Vec<FoodRecord>> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| PantryError::DataFormat(format!("invalid JSON: {}", e)))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => {
            return Err(PantryError::DataFormat(
                "expected a JSON array of food records".to_string(),
            ))
        }
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let raw: RawFoodRecord = serde_json::from_value(item).map_err(|e| {
            PantryError::DataFormat(format!("record #{} is malformed: {}", index + 1, e))
        })?;
        let record = raw.validate(index)?;

        if !seen.insert(record.id.clone()) {
            return Err(PantryError::DataFormat(format!(
                "record #{} reuses id {}",
                index + 1,
                record.id
            )));
        }
        records.push(record);
    }

    debug!("Validated {} records", records.len());
    Ok(records)
}

fn strip_prefix(err: PantryError) -> String {
    match err {
        PantryError::DataFormat(msg) => msg,
        other => other.to_string(),
    }
}
