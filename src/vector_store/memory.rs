//! In-memory vector store implementation.
//!
//! Useful for testing and offline runs. Scores are lexical (cosine over the
//! sets of lowercase words) rather than learned embeddings.

use super::{
    IndexInfo, Namespace, NamespaceInfo, QueryRequest, RetrievalResult, VectorRecord, VectorStore,
};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone)]
struct StoredVector {
    terms: BTreeSet<String>,
    record: VectorRecord,
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    namespaces: RwLock<HashMap<Namespace, BTreeMap<String, StoredVector>>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    /// Number of vectors in `namespace`.
    pub fn len(&self, namespace: &Namespace) -> usize {
        let namespaces = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        namespaces.get(namespace).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, namespace: &Namespace) -> bool {
        self.len(namespace) == 0
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn lexical_similarity(query: &BTreeSet<String>, doc: &BTreeSet<String>) -> f32 {
    if query.is_empty() || doc.is_empty() {
        return 0.0;
    }
    let shared = query.intersection(doc).count() as f32;
    shared / ((query.len() * doc.len()) as f32).sqrt()
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, records: &[VectorRecord], namespace: &Namespace) -> Result<()> {
        let mut namespaces = self.namespaces.write().unwrap_or_else(PoisonError::into_inner);
        let store = namespaces.entry(namespace.clone()).or_default();
        for record in records {
            store.insert(
                record.key.clone(),
                StoredVector {
                    terms: terms(&record.data),
                    record: record.clone(),
                },
            );
        }
        Ok(())
    }

    async fn query(&self, request: &QueryRequest<'_>) -> Result<Vec<RetrievalResult>> {
        let namespaces = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        let Some(store) = namespaces.get(request.namespace) else {
            return Ok(Vec::new());
        };

        let query_terms = terms(request.text);
        let mut results: Vec<RetrievalResult> = store
            .values()
            .map(|stored| RetrievalResult {
                key: stored.record.key.clone(),
                score: lexical_similarity(&query_terms, &stored.terms),
                metadata: if request.include_metadata {
                    stored.record.metadata.clone()
                } else {
                    Default::default()
                },
            })
            .collect();

        // Stable sort keeps key order for ties.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(request.top_k);

        Ok(results)
    }

    async fn info(&self) -> Result<IndexInfo> {
        let namespaces = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);

        let mut info = IndexInfo {
            similarity_function: "LEXICAL".to_string(),
            ..Default::default()
        };
        for (namespace, store) in namespaces.iter() {
            let count = store.len() as u64;
            info.vector_count += count;
            info.namespaces.insert(
                namespace.clone(),
                NamespaceInfo {
                    vector_count: count,
                    pending_vector_count: 0,
                },
            );
        }

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{to_vector_record, FoodRecord};
    use crate::vector_store::NamespaceState;
    use tokio_test::assert_ok;

    fn records() -> Vec<VectorRecord> {
        vec![
            to_vector_record(&FoodRecord::new(1, "Pancakes are a breakfast food.").with_region("USA")),
            to_vector_record(&FoodRecord::new(2, "Sushi is vinegared rice.").with_region("Japan")),
            to_vector_record(&FoodRecord::new(3, "Paella is a rice dish.").with_region("Spain")),
        ]
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();
        let foods = Namespace::new("foods");

        store.upsert(&records(), &foods).await.unwrap();
        assert_eq!(store.len(&foods), 3);

        let results = store
            .query(&QueryRequest {
                text: "rice dish",
                top_k: 2,
                include_metadata: true,
                namespace: &foods,
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].key, "food_3");
        assert!(results[0].score >= results[1].score);
        assert_eq!(results[0].metadata.original_text, "Paella is a rice dish.");
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = MemoryVectorStore::new();
        let foods = Namespace::new("foods");
        let other = Namespace::default_partition();

        store.upsert(&records(), &foods).await.unwrap();

        let results = store
            .query(&QueryRequest {
                text: "rice",
                top_k: 5,
                include_metadata: true,
                namespace: &other,
            })
            .await
            .unwrap();
        assert!(results.is_empty());

        assert_eq!(
            store.get_or_create_namespace_state(&other).await.unwrap(),
            NamespaceState::NotYetCreated
        );
        assert_eq!(
            store.get_or_create_namespace_state(&foods).await.unwrap(),
            NamespaceState::Exists { count: 3 }
        );
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_key() {
        let store = MemoryVectorStore::new();
        let foods = Namespace::new("foods");

        assert_ok!(store.upsert(&records(), &foods).await);
        assert_ok!(store.upsert(&records(), &foods).await);
        assert_eq!(store.len(&foods), 3);
    }

    #[test]
    fn test_info_counts_namespaces() {
        let store = MemoryVectorStore::new();
        tokio_test::block_on(async {
            assert_ok!(store.upsert(&records(), &Namespace::new("foods")).await);
            assert_ok!(store.upsert(&records()[..1], &Namespace::new("drinks")).await);
        });

        let info = assert_ok!(tokio_test::block_on(store.info()));
        assert_eq!(info.vector_count, 4);
        assert_eq!(info.namespaces.len(), 2);
    }

    #[test]
    fn test_lexical_similarity() {
        let a = terms("Rice dish");
        assert!((lexical_similarity(&a, &terms("rice DISH")) - 1.0).abs() < 1e-6);
        assert_eq!(lexical_similarity(&a, &terms("pancakes")), 0.0);
        assert_eq!(lexical_similarity(&terms(""), &a), 0.0);
    }
}
