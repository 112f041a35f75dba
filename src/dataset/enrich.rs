//! Embedding text enrichment.
//!
//! The text sent for embedding is the record description followed by short
//! clauses built from its structured fields. The clause order is fixed so the
//! same record always embeds the same way across runs.

use super::FoodRecord;
use crate::vector_store::{FoodMetadata, VectorRecord};

/// Vector-store key for a record.
pub fn vector_key(record: &FoodRecord) -> String {
    format!("food_{}", record.id)
}

/// Build the text that gets embedded for `record`.
pub fn prepare_enriched_text(record: &FoodRecord) -> String {
    let mut parts = vec![record.text.trim().to_string()];

    if let Some(region) = present(&record.region) {
        parts.push(format!("This food is popular in {}.", region));
    }
    if let Some(food_type) = present(&record.food_type) {
        parts.push(format!("It is a type of {}.", food_type));
    }
    if let Some(origin) = present(&record.origin) {
        parts.push(sentence("Origin", origin));
    }
    if let Some(ingredients) = joined(&record.ingredients) {
        parts.push(sentence("Ingredients", &ingredients));
    }
    if let Some(preparation) = present(&record.preparation) {
        parts.push(sentence("Preparation", preparation));
    }
    if let Some(significance) = present(&record.cultural_significance) {
        parts.push(sentence("Cultural significance", significance));
    }
    if let Some(dietary) = joined(&record.dietary) {
        parts.push(sentence("Dietary", &dietary));
    }

    parts.join(" ")
}

/// Build the unit sent to the vector store.
pub fn to_vector_record(record: &FoodRecord) -> VectorRecord {
    VectorRecord {
        key: vector_key(record),
        data: prepare_enriched_text(record),
        metadata: FoodMetadata::from(record),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn joined(values: &[String]) -> Option<String> {
    let items: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}

fn sentence(label: &str, value: &str) -> String {
    if value.ends_with(['.', '!', '?']) {
        format!("{}: {}", label, value)
    } else {
        format!("{}: {}.", label, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RecordId;

    fn pad_thai() -> FoodRecord {
        let mut record = FoodRecord::new(12, "Pad Thai is a stir-fried rice noodle dish.")
            .with_region("Thailand")
            .with_type("Main Course");
        record.origin = Some("Central Thailand".to_string());
        record.ingredients = vec!["rice noodles".to_string(), "tamarind".to_string()];
        record.preparation = Some("Stir-fried in a hot wok".to_string());
        record.cultural_significance = Some("A national dish promoted in the 1930s.".to_string());
        record.dietary = vec!["dairy-free".to_string()];
        record
    }

    #[test]
    fn test_enrichment_order_and_wording() {
        let text = prepare_enriched_text(&pad_thai());
        assert_eq!(
            text,
            "Pad Thai is a stir-fried rice noodle dish. \
             This food is popular in Thailand. \
             It is a type of Main Course. \
             Origin: Central Thailand. \
             Ingredients: rice noodles, tamarind. \
             Preparation: Stir-fried in a hot wok. \
             Cultural significance: A national dish promoted in the 1930s. \
             Dietary: dairy-free."
        );
    }

    #[test]
    fn test_enrichment_is_deterministic() {
        let record = pad_thai();
        assert_eq!(prepare_enriched_text(&record), prepare_enriched_text(&record));
    }

    #[test]
    fn test_bare_record_is_unchanged() {
        let record = FoodRecord::new(1, "Croissant is a buttery pastry.");
        assert_eq!(prepare_enriched_text(&record), "Croissant is a buttery pastry.");
    }

    #[test]
    fn test_blank_optional_fields_are_skipped() {
        let mut record = FoodRecord::new(1, "Injera is a sourdough flatbread.").with_region("  ");
        record.ingredients = vec![" ".to_string()];
        assert_eq!(prepare_enriched_text(&record), "Injera is a sourdough flatbread.");
    }

    #[test]
    fn test_vector_record_keeps_original_text() {
        let record = pad_thai();
        let vector = to_vector_record(&record);

        assert_eq!(vector.key, "food_12");
        assert_eq!(vector.metadata.original_text, record.text);
        assert_eq!(vector.metadata.id, Some(RecordId::Int(12)));
        assert_ne!(vector.data, record.text);
    }

    #[test]
    fn test_string_ids_form_keys() {
        let record = FoodRecord::new("ramen", "Ramen is a noodle soup.");
        assert_eq!(vector_key(&record), "food_ramen");
    }
}
