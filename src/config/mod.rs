//! Configuration module for Paddock.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LanguageSettings, LlmSettings,
    PromptSettings, RagSettings, ScrapingSettings, ServerSettings, Settings,
    VectorStoreProvider, VectorStoreSettings,
};
