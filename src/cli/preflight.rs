//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail midway.

use crate::config::{Settings, VectorStoreProvider};
use crate::error::{PaddockError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Scraping and indexing needs embeddings and the index.
    Ingest,
    /// Searching needs embeddings and the index.
    Search,
    /// Answering additionally needs the chat model.
    Ask,
}

/// Run pre-flight checks for the given operation against the process environment.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_with(operation, settings, |key| std::env::var(key).ok())
}

/// Run pre-flight checks using the given environment lookup.
pub fn check_with<F>(operation: Operation, settings: &Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    require_env(&lookup, "OPENAI_API_KEY", "sk-...")?;

    if settings.vector_store.provider == VectorStoreProvider::Pinecone
        && settings.vector_store.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
    {
        return Err(missing("PINECONE_API_KEY", "pcsk_..."));
    }

    if let Operation::Ask = operation {
        if settings.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(missing("GROQ_API_KEY", "gsk_..."));
        }
    }

    Ok(())
}

fn require_env<F>(lookup: &F, key: &str, example: &str) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(missing(key, example)),
    }
}

fn missing(key: &str, example: &str) -> PaddockError {
    PaddockError::Config(format!("{} not set. Set it with: export {}='{}'", key, key, example))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_keys() -> Settings {
        let mut settings = Settings::default();
        settings.vector_store.api_key = Some("pc".to_string());
        settings.llm.api_key = Some("gsk".to_string());
        settings
    }

    #[test]
    fn test_missing_openai_key() {
        let err = check_with(Operation::Search, &settings_with_keys(), |_| None).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_ask_requires_groq_key() {
        let mut settings = settings_with_keys();
        settings.llm.api_key = None;
        let env = |_: &str| Some("sk-test".to_string());

        assert!(check_with(Operation::Ingest, &settings, env).is_ok());
        let err = check_with(Operation::Ask, &settings, env).unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_memory_store_needs_no_pinecone_key() {
        let mut settings = settings_with_keys();
        settings.vector_store.provider = VectorStoreProvider::Memory;
        settings.vector_store.api_key = None;
        assert!(check_with(Operation::Search, &settings, |_| Some("sk".to_string())).is_ok());
    }
}
