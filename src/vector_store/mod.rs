//! Vector store abstraction for Paddock.
//!
//! Provides a trait-based interface over the hosted index and an in-process
//! store used for tests and offline runs.

mod memory;
mod pinecone;

pub use memory::MemoryVectorStore;
pub use pinecone::PineconeVectorStore;

use crate::chunking::{Chunk, ChunkMetadata};
use crate::config::{Settings, VectorStoreProvider};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A chunk with its embedding, ready to be stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl VectorRecord {
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.id,
            embedding,
            content: chunk.content,
            metadata: chunk.metadata,
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Index statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub dimension: Option<u32>,
    pub total_vector_count: u64,
    pub index_fullness: Option<f64>,
    /// Vector count per namespace.
    pub namespaces: BTreeMap<String, u64>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert records, replacing any with the same id. Returns the number written.
    async fn upsert_batch(&self, records: &[VectorRecord]) -> Result<usize>;

    /// Nearest neighbours of `query_embedding`, best first.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let results = self.search(query_embedding, limit).await?;
        Ok(results.into_iter().filter(|r| r.score >= min_score).collect())
    }

    /// Index statistics.
    async fn stats(&self) -> Result<IndexStats>;
}

/// Create the configured vector store, creating the hosted index if needed.
pub async fn create_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider {
        VectorStoreProvider::Pinecone => {
            let store =
                PineconeVectorStore::connect(&settings.vector_store, settings.embedding.dimensions).await?;
            Ok(Arc::new(store))
        }
        VectorStoreProvider::Memory => Ok(Arc::new(MemoryVectorStore::new())),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
