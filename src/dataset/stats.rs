//! Dataset statistics for the `verify` command.

use super::FoodRecord;
use std::collections::BTreeSet;

/// Summary of a loaded dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetStats {
    pub total: usize,
    pub regions: BTreeSet<String>,
    pub types: BTreeSet<String>,
    pub dietary: BTreeSet<String>,
    pub allergens: BTreeSet<String>,
    /// Mean word count of the `text` field.
    pub average_words: f64,
    pub with_region: usize,
    pub with_type: usize,
    pub with_ingredients: usize,
    pub with_cultural_significance: usize,
    pub with_nutrition: usize,
}

impl DatasetStats {
    pub fn from_records(records: &[FoodRecord]) -> Self {
        let mut stats = DatasetStats {
            total: records.len(),
            ..Default::default()
        };
        let mut words = 0usize;

        for record in records {
            words += record.text.split_whitespace().count();

            if let Some(region) = non_blank(&record.region) {
                stats.regions.insert(region.to_string());
                stats.with_region += 1;
            }
            if let Some(food_type) = non_blank(&record.food_type) {
                stats.types.insert(food_type.to_string());
                stats.with_type += 1;
            }
            if !record.ingredients.is_empty() {
                stats.with_ingredients += 1;
            }
            if non_blank(&record.cultural_significance).is_some() {
                stats.with_cultural_significance += 1;
            }
            if non_blank(&record.nutrition).is_some() {
                stats.with_nutrition += 1;
            }
            stats.dietary.extend(record.dietary.iter().cloned());
            stats.allergens.extend(record.allergens.iter().cloned());
        }

        if stats.total > 0 {
            stats.average_words = words as f64 / stats.total as f64;
        }
        stats
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
