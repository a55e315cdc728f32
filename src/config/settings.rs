//! Configuration settings for Paddock.

use crate::error::{PaddockError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub rag: RagSettings,
    pub language: LanguageSettings,
    pub scraping: ScrapingSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Hosted LLM settings (Groq, OpenAI-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible chat completions API.
    pub api_base: String,
    /// API key. Read from `GROQ_API_KEY`, never written back to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model used for answers.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.7,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions (also the dimension of the vector index).
    pub dimensions: u32,
    /// Alternative OpenAI-compatible base URL (e.g. a local embedding server).
    pub api_base: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            api_base: None,
        }
    }
}

/// Text chunking settings. Sizes are measured in tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Tokenizer encoding used as the length function.
    pub encoding: String,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 100,
            encoding: "cl100k_base".to_string(),
        }
    }
}

/// Vector store provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// Hosted Pinecone serverless index.
    #[default]
    Pinecone,
    /// In-process store, lost on exit.
    Memory,
}

impl std::str::FromStr for VectorStoreProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pinecone" => Ok(VectorStoreProvider::Pinecone),
            "memory" => Ok(VectorStoreProvider::Memory),
            _ => Err(format!("Unknown vector store provider: {}", s)),
        }
    }
}

impl std::fmt::Display for VectorStoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorStoreProvider::Pinecone => write!(f, "pinecone"),
            VectorStoreProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub provider: VectorStoreProvider,
    /// Pinecone API key. Read from `PINECONE_API_KEY`, never written back to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub index_name: String,
    /// Cloud region of the serverless index.
    pub environment: String,
    pub cloud: String,
    pub metric: String,
    pub namespace: String,
    /// Pinecone control plane URL.
    pub control_plane_url: String,
    /// Vectors per upsert request.
    pub upsert_batch_size: usize,
    /// How long to wait for a freshly created index to become ready.
    pub ready_timeout_seconds: u64,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Pinecone,
            api_key: None,
            index_name: "f1-multilingual-kb".to_string(),
            environment: "us-east-1".to_string(),
            cloud: "aws".to_string(),
            metric: "cosine".to_string(),
            namespace: String::new(),
            control_plane_url: "https://api.pinecone.io".to_string(),
            upsert_batch_size: 100,
            ready_timeout_seconds: 60,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Minimum similarity score for a retrieved chunk.
    pub similarity_threshold: f32,
    /// Maximum number of sources returned to the user.
    pub max_sources: usize,
    /// Answers are cut down to this many sentences.
    pub max_sentences: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 10,
            similarity_threshold: 0.3,
            max_sources: 5,
            max_sentences: 3,
        }
    }
}

/// Language detection and translation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSettings {
    /// Supported language codes.
    pub supported: Vec<String>,
    /// Base URL of the translation endpoint.
    pub translate_url: String,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            supported: vec!["en".to_string(), "hi".to_string()],
            translate_url: "https://translate.googleapis.com".to_string(),
        }
    }
}

/// Scraper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingSettings {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Politeness delay between requests to the same source.
    pub request_delay_ms: u64,
    pub wikipedia_api_url: String,
    pub wikipedia_topics: Vec<String>,
    pub openf1_base_url: String,
    /// Season used for OpenF1 sessions and meetings.
    pub season: i32,
    pub motorsport_base_url: String,
    pub autosport_base_url: String,
    pub f1nsight_url: String,
    pub official_base_url: String,
    pub official_news_paths: Vec<String>,
    pub rss_feeds: Vec<String>,
    /// Worker count for the multi-season scraper.
    pub max_workers: usize,
    /// Run the headless browser without a window.
    pub headless: bool,
}

impl Default for ScrapingSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            timeout_seconds: 30,
            request_delay_ms: 1000,
            wikipedia_api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            wikipedia_topics: default_wikipedia_topics(),
            openf1_base_url: "https://api.openf1.org/v1".to_string(),
            season: 2025,
            motorsport_base_url: "https://www.motorsport.com".to_string(),
            autosport_base_url: "https://www.autosport.com".to_string(),
            f1nsight_url: "https://www.f1nsight.com/".to_string(),
            official_base_url: "https://www.formula1.com".to_string(),
            official_news_paths: vec![
                "/en/latest".to_string(),
                "/en/latest/all.html".to_string(),
            ],
            rss_feeds: vec![
                "https://www.motorsport.com/rss/f1/news/".to_string(),
                "https://www.autosport.com/rss/f1/news/".to_string(),
                "https://www.skysports.com/rss/12433".to_string(),
                "https://feeds.feedburner.com/FormulaOneFeed".to_string(),
            ],
            max_workers: 3,
            headless: true,
        }
    }
}

fn default_wikipedia_topics() -> Vec<String> {
    [
        "Formula One",
        "Formula One drivers",
        "Formula One constructors",
        "2024 Formula One World Championship",
        "List of Formula One World Drivers' Champions",
        "List of Formula One circuits",
        "Formula One regulations",
        "Formula One car",
        "Max Verstappen",
        "Lewis Hamilton",
        "Charles Leclerc",
        "Lando Norris",
        "Oscar Piastri",
        "Red Bull Racing",
        "Mercedes-AMG Petronas Formula One Team",
        "Scuderia Ferrari",
        "McLaren",
        "Monaco Grand Prix",
        "British Grand Prix",
        "Italian Grand Prix",
        "Formula One safety",
        "DRS (Formula One)",
        "Energy Recovery System",
        "Turbo-hybrid",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment variables override file values.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GROQ_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = non_empty("GROQ_MODEL") {
            self.llm.model = model;
        }
        if let Some(key) = non_empty("PINECONE_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
        if let Some(name) = non_empty("PINECONE_INDEX_NAME") {
            self.vector_store.index_name = name;
        }
        if let Some(env) = non_empty("PINECONE_ENVIRONMENT") {
            self.vector_store.environment = env;
        }
        if let Some(model) = non_empty("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(size) = non_empty("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_number("CHUNK_SIZE", &size)?;
        }
        if let Some(overlap) = non_empty("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_number("CHUNK_OVERLAP", &overlap)?;
        }

        Ok(())
    }

    /// Check that the settings describe a usable configuration.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(PaddockError::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(PaddockError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(PaddockError::Config("rag.top_k must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PaddockError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("paddock")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| PaddockError::Config(format!("{} must be a positive integer, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.vector_store.index_name, "f1-multilingual-kb");
        assert_eq!(settings.vector_store.environment, "us-east-1");
        assert_eq!(settings.llm.model, "llama-3.1-8b-instant");
        assert_eq!(settings.chunking.chunk_size, 512);
        assert_eq!(settings.chunking.chunk_overlap, 100);
        assert_eq!(settings.rag.top_k, 10);
        assert_eq!(settings.language.supported, vec!["en", "hi"]);
        assert_eq!(settings.scraping.wikipedia_topics.len(), 24);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_env(lookup(&[
                ("GROQ_API_KEY", "gsk_test"),
                ("PINECONE_API_KEY", "pc_test"),
                ("PINECONE_INDEX_NAME", "f1-test"),
                ("CHUNK_SIZE", "256"),
                ("CHUNK_OVERLAP", "32"),
                ("GROQ_MODEL", ""),
            ]))
            .unwrap();

        assert_eq!(settings.llm.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(settings.vector_store.api_key.as_deref(), Some("pc_test"));
        assert_eq!(settings.vector_store.index_name, "f1-test");
        assert_eq!(settings.chunking.chunk_size, 256);
        assert_eq!(settings.chunking.chunk_overlap, 32);
        // Empty values are ignored
        assert_eq!(settings.llm.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_invalid_numeric_override() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(lookup(&[("CHUNK_SIZE", "large")]))
            .unwrap_err();
        assert!(matches!(err, PaddockError::Config(_)));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut settings = Settings::default();
        settings.chunking.chunk_overlap = settings.chunking.chunk_size;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_and_load_without_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.vector_store.api_key = Some("secret".to_string());
        settings.vector_store.provider = VectorStoreProvider::Memory;
        settings.rag.top_k = 7;
        settings.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("secret"));

        let loaded: Settings = toml::from_str(&content).unwrap();
        assert_eq!(loaded.vector_store.provider, VectorStoreProvider::Memory);
        assert_eq!(loaded.rag.top_k, 7);
        assert!(loaded.vector_store.api_key.is_none());
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("Pinecone".parse::<VectorStoreProvider>().unwrap(), VectorStoreProvider::Pinecone);
        assert_eq!("memory".parse::<VectorStoreProvider>().unwrap(), VectorStoreProvider::Memory);
        assert!("sqlite".parse::<VectorStoreProvider>().is_err());
    }
}
