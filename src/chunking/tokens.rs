//! Token counting used as the chunk length function.

use crate::error::{PaddockError, Result};
use tiktoken_rs::CoreBPE;

/// Measures text length in model tokens.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

/// BPE token counter backed by `tiktoken-rs`.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Load a counter for a named encoding (e.g. `cl100k_base`).
    pub fn new(encoding: &str) -> Result<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(PaddockError::Config(format!(
                    "Unknown tokenizer encoding: {}",
                    other
                )))
            }
        }
        .map_err(|e| PaddockError::Chunking(format!("Failed to load {}: {}", encoding, e)))?;

        Ok(Self { bpe })
    }

    /// The encoding used by the embedding and chat models.
    pub fn cl100k() -> Result<Self> {
        Self::new("cl100k_base")
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cl100k_counts_tokens() {
        let counter = TiktokenCounter::cl100k().unwrap();
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("hello world"), 2);
        assert!(counter.count("Max Verstappen won the 2023 championship.") > 5);
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            TiktokenCounter::new("gpt2_fancy"),
            Err(PaddockError::Config(_))
        ));
    }
}
