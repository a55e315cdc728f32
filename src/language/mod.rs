//! Language detection and translation between English and Hindi.
//!
//! Retrieval and generation always happen in English; the handler maps a
//! Hindi question into English and the English answer back into Hindi.

mod translate;

pub use translate::{GoogleTranslator, Translator};

use crate::config::{LanguageSettings, RagPrompts};
use crate::error::{PaddockError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use whatlang::{Lang, Script};

/// A language the chat supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }

    pub fn all() -> [Language; 2] {
        [Language::English, Language::Hindi]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = PaddockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "hi" | "hindi" => Ok(Language::Hindi),
            other => Err(PaddockError::InvalidInput(format!("Unsupported language: {}", other))),
        }
    }
}

/// Detect whether `text` is Hindi. Anything else, including text too short
/// to classify, is treated as English.
pub fn detect_language(text: &str) -> Language {
    let text = text.trim();
    if text.is_empty() {
        return Language::English;
    }

    match whatlang::detect(text) {
        Some(info) if info.lang() == Lang::Hin || info.script() == Script::Devanagari => Language::Hindi,
        Some(_) => Language::English,
        None => match whatlang::detect_script(text) {
            Some(Script::Devanagari) => Language::Hindi,
            _ => Language::English,
        },
    }
}

/// Detects languages and translates questions and answers.
pub struct LanguageHandler {
    translator: Arc<dyn Translator>,
    prompts: RagPrompts,
    supported: Vec<Language>,
}

impl LanguageHandler {
    pub fn new(translator: Arc<dyn Translator>, prompts: RagPrompts, settings: &LanguageSettings) -> Self {
        let supported = settings
            .supported
            .iter()
            .filter_map(|code| match code.parse() {
                Ok(lang) => Some(lang),
                Err(e) => {
                    tracing::warn!("Ignoring configured language: {}", e);
                    None
                }
            })
            .collect();

        Self {
            translator,
            prompts,
            supported,
        }
    }

    /// Languages accepted by the chat.
    pub fn supported_languages(&self) -> &[Language] {
        &self.supported
    }

    /// Detect the language of a question, falling back to English when it is
    /// not one of the supported languages.
    pub fn detect_language(&self, text: &str) -> Language {
        let detected = detect_language(text);
        if self.supported.contains(&detected) {
            detected
        } else {
            Language::English
        }
    }

    /// Translate a question into English. On failure the input is returned as is.
    pub async fn translate_to_english(&self, text: &str, source: Language) -> String {
        if source == Language::English {
            return text.to_string();
        }
        self.translate_or_keep(text, source, Language::English).await
    }

    /// Translate an English answer into `target`. On failure the input is returned as is.
    pub async fn translate_response(&self, text: &str, target: Language) -> String {
        if target == Language::English {
            return text.to_string();
        }
        self.translate_or_keep(text, Language::English, target).await
    }

    /// System prompt for answering in `language`.
    pub fn language_specific_prompt(&self, language: Language) -> &str {
        self.prompts.system(language)
    }

    async fn translate_or_keep(&self, text: &str, source: Language, target: Language) -> String {
        match self.translator.translate(text, source.code(), target.code()).await {
            Ok(translated) if !translated.trim().is_empty() => translated,
            Ok(_) => {
                tracing::warn!("Empty translation {} -> {}, keeping original", source, target);
                text.to_string()
            }
            Err(e) => {
                tracing::warn!("Translation {} -> {} failed: {}", source, target, e);
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Translator that tags text with the target language and records calls.
    #[derive(Default)]
    pub struct TaggingTranslator {
        pub fail: bool,
        pub calls: Mutex<Vec<(String, String, String)>>,
    }

    impl TaggingTranslator {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Translator for TaggingTranslator {
        async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), source.to_string(), target.to_string()));
            if self.fail {
                return Err(PaddockError::Translation("service unavailable".to_string()));
            }
            Ok(format!("[{}] {}", target, text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::TaggingTranslator;
    use super::*;

    fn handler(translator: Arc<TaggingTranslator>) -> LanguageHandler {
        LanguageHandler::new(translator, RagPrompts::default(), &LanguageSettings::default())
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("फॉर्मूला 1 में DRS क्या है?"), Language::Hindi);
        assert_eq!(detect_language("मैक्लारेन F1 टीम के इतिहास के बारे में बताएं"), Language::Hindi);
        assert_eq!(detect_language("Who holds the record for most F1 wins?"), Language::English);
        assert_eq!(detect_language(""), Language::English);
        assert_eq!(detect_language("123 ???"), Language::English);
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::Hindi.code(), "hi");
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(serde_json::to_value(Language::Hindi).unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_english_is_never_translated() {
        let translator = Arc::new(TaggingTranslator::default());
        let handler = handler(translator.clone());

        assert_eq!(handler.translate_to_english("What is DRS?", Language::English).await, "What is DRS?");
        assert_eq!(handler.translate_response("DRS opens a flap.", Language::English).await, "DRS opens a flap.");
        assert!(translator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hindi_round_trip() {
        let translator = Arc::new(TaggingTranslator::default());
        let handler = handler(translator.clone());

        let english = handler.translate_to_english("DRS क्या है?", Language::Hindi).await;
        assert_eq!(english, "[en] DRS क्या है?");
        let hindi = handler.translate_response("DRS opens a flap.", Language::Hindi).await;
        assert_eq!(hindi, "[hi] DRS opens a flap.");

        let calls = translator.calls.lock().unwrap();
        assert_eq!(calls[0].1, "hi");
        assert_eq!(calls[1].2, "hi");
    }

    #[tokio::test]
    async fn test_translation_failure_returns_input() {
        let handler = handler(Arc::new(TaggingTranslator::failing()));
        assert_eq!(handler.translate_to_english("DRS क्या है?", Language::Hindi).await, "DRS क्या है?");
    }

    #[test]
    fn test_unsupported_detection_falls_back_to_english() {
        let settings = LanguageSettings {
            supported: vec!["en".to_string(), "xx".to_string()],
            ..Default::default()
        };
        let handler = LanguageHandler::new(Arc::new(TaggingTranslator::default()), RagPrompts::default(), &settings);
        assert_eq!(handler.supported_languages(), &[Language::English]);
        assert_eq!(handler.detect_language("फॉर्मूला 1 क्या है?"), Language::English);
    }

    #[test]
    fn test_language_specific_prompt() {
        let handler = handler(Arc::new(TaggingTranslator::default()));
        let hindi = handler.language_specific_prompt(Language::Hindi);
        assert!(hindi.starts_with("आप एक फॉर्मूला 1 विशेषज्ञ सहायक हैं"));
        assert!(!hindi.contains("{{context}}"));
        assert!(handler
            .language_specific_prompt(Language::English)
            .starts_with("You are an expert Formula 1 assistant"));
    }
}
