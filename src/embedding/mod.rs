//! Embedding generation for semantic search and retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    /// Deterministic bag-of-words embedder: texts sharing words score high.
    pub struct HashingEmbedder {
        dimensions: usize,
    }

    impl HashingEmbedder {
        pub fn new(dimensions: usize) -> Self {
            Self { dimensions }
        }

        fn vector(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0; self.dimensions];
            for word in text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| w.len() > 2)
            {
                let mut hasher = DefaultHasher::new();
                word.to_lowercase().hash(&mut hasher);
                vector[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
            }
            vector
        }
    }

    #[async_trait]
    impl Embedder for HashingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| self.vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }
}
