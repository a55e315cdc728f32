//! Context retrieval for RAG answers.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchResult, VectorStore};
use std::sync::Arc;
use tracing::debug;

/// Retrieves the chunks a question is answered from.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    min_score: f32,
}

impl ContextBuilder {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            top_k: 10,
            min_score: 0.3,
        }
    }

    /// Set the number of chunks retrieved.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Embed the query and return the closest chunks above the threshold.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        let results = self
            .vector_store
            .search_with_threshold(&query_embedding, self.top_k, self.min_score)
            .await?;
        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }
}

/// Stuff all retrieved chunk texts into one context block.
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkMetadata;
    use crate::embedding::fakes::HashingEmbedder;
    use crate::vector_store::{MemoryVectorStore, VectorRecord};

    fn result(content: &str) -> SearchResult {
        SearchResult {
            id: content.to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata::default(),
            score: 1.0,
        }
    }

    #[test]
    fn test_format_context_joins_with_blank_lines() {
        let context = format_context(&[result("Monaco is tight."), result("  "), result("Monza is fast.\n")]);
        assert_eq!(context, "Monaco is tight.\n\nMonza is fast.");
    }

    #[tokio::test]
    async fn test_retrieve_applies_threshold_and_top_k() {
        let embedder = Arc::new(HashingEmbedder::new(64));
        let store = Arc::new(MemoryVectorStore::new());

        let texts = [
            "Max Verstappen won the championship with Red Bull",
            "Verstappen Red Bull championship winner again",
            "Pasta recipes for dinner",
        ];
        let embeddings = embedder
            .embed_batch(&texts.iter().map(|t| t.to_string()).collect::<Vec<_>>())
            .await
            .unwrap();
        let records: Vec<VectorRecord> = texts
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (text, embedding))| VectorRecord {
                id: format!("doc_{}", i),
                embedding,
                content: text.to_string(),
                metadata: ChunkMetadata::default(),
            })
            .collect();
        store.upsert_batch(&records).await.unwrap();

        let builder = ContextBuilder::new(store, embedder).with_top_k(1).with_min_score(0.3);
        let results = builder.retrieve("Verstappen Red Bull championship").await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].content.contains("Verstappen"));
    }
}
