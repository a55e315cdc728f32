//! In-memory vector store implementation.
//!
//! Useful for testing and offline runs; contents are lost on exit.

use super::{cosine_similarity, IndexStats, SearchResult, VectorRecord, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Look up a record by id.
    pub async fn get(&self, id: &str) -> Option<VectorRecord> {
        self.records.read().await.get(id).cloned()
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, records: &[VectorRecord]) -> Result<usize> {
        let mut store = self.records.write().await;
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let records = self.records.read().await;

        let mut results: Vec<SearchResult> = records
            .values()
            .map(|record| SearchResult {
                id: record.id.clone(),
                content: record.content.clone(),
                metadata: record.metadata.clone(),
                score: cosine_similarity(query_embedding, &record.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let records = self.records.read().await;
        let dimension = records.values().next().map(|r| r.embedding.len() as u32);
        let count = records.len() as u64;

        Ok(IndexStats {
            dimension,
            total_vector_count: count,
            index_fullness: None,
            namespaces: [(String::new(), count)].into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkMetadata;

    fn record(id: &str, content: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            embedding,
            content: content.to_string(),
            metadata: ChunkMetadata {
                title: content.to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .upsert_batch(&[
                record("a_0", "Hamilton", vec![1.0, 0.0, 0.0]),
                record("b_0", "Verstappen", vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a_0");
        assert!(results[0].score > results[1].score);

        let filtered = store.search_with_threshold(&[1.0, 0.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_id() {
        let store = MemoryVectorStore::new();
        store.upsert_batch(&[record("x_0", "old", vec![1.0, 0.0])]).await.unwrap();
        store.upsert_batch(&[record("x_0", "new", vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("x_0").await.unwrap().content, "new");

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_vector_count, 1);
        assert_eq!(stats.dimension, Some(2));
    }
}
