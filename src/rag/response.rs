//! RAG answer generation.

use super::{format_context, post_process, ContextBuilder};
use crate::chunking::ChunkMetadata;
use crate::config::{Prompts, RagSettings};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::language::{Language, LanguageHandler};
use crate::llm::ChatModel;
use crate::vector_store::VectorStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// A cited source for an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub source: String,
    pub url: String,
    pub section: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

impl From<&ChunkMetadata> for SourceRef {
    fn from(metadata: &ChunkMetadata) -> Self {
        let or = |value: &str, fallback: &str| {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };

        Self {
            title: or(&metadata.title, "Unknown"),
            source: or(&metadata.source, "Unknown"),
            url: metadata.url.clone(),
            section: metadata.section.clone(),
            doc_type: or(&metadata.doc_type, "text"),
        }
    }
}

/// The answer to a chat question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub language: Language,
    pub original_question: String,
    pub english_question: String,
    /// Number of chunks the answer was generated from.
    pub retrieved_docs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    /// Localized apology returned when answering fails.
    fn failure(question: &str, language: Language, error: String) -> Self {
        let answer = match language {
            Language::English => {
                "I'm sorry, I encountered an error while processing your question. Please try again."
            }
            Language::Hindi => {
                "क्षमा करें, आपके प्रश्न को संसाधित करते समय मुझे एक त्रुटि का सामना करना पड़ा। कृपया पुनः प्रयास करें।"
            }
        };

        Self {
            answer: answer.to_string(),
            sources: Vec::new(),
            language,
            original_question: question.to_string(),
            english_question: question.to_string(),
            retrieved_docs: 0,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Format the response for terminal display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!("\n{} ({}, {})", source.title, source.source, source.doc_type));
                if !source.section.is_empty() {
                    output.push_str(&format!(" - {}", source.section));
                }
                if !source.url.is_empty() {
                    output.push_str(&format!("\n  {}", source.url));
                }
            }
        }

        output
    }
}

/// Answers questions from the knowledge base in the asker's language.
pub struct RagEngine {
    context_builder: ContextBuilder,
    language: Arc<LanguageHandler>,
    llm: Arc<dyn ChatModel>,
    prompts: Prompts,
    max_sources: usize,
    max_sentences: usize,
}

impl RagEngine {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        language: Arc<LanguageHandler>,
        llm: Arc<dyn ChatModel>,
        settings: &RagSettings,
    ) -> Self {
        let context_builder = ContextBuilder::new(vector_store, embedder)
            .with_top_k(settings.top_k)
            .with_min_score(settings.similarity_threshold);

        Self {
            context_builder,
            language,
            llm,
            prompts: Prompts::default(),
            max_sources: settings.max_sources,
            max_sentences: settings.max_sentences,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn language_handler(&self) -> &LanguageHandler {
        &self.language
    }

    /// Answer a question. Failures become an apology in the question's language.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn query(&self, question: &str) -> ChatResponse {
        let language = self.language.detect_language(question);
        info!("Processing {} question", language);

        match self.answer(question, language).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to answer question: {}", e);
                ChatResponse::failure(question, language, e.to_string())
            }
        }
    }

    async fn answer(&self, question: &str, language: Language) -> Result<ChatResponse> {
        let english_question = self.language.translate_to_english(question, language).await;

        let results = self.context_builder.retrieve(&english_question).await?;

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context(&results));
        vars.insert("question".to_string(), english_question.clone());
        let prompt = self
            .prompts
            .render_with_custom(self.prompts.rag.template(language), &vars);

        let answer = self
            .llm
            .complete(self.language.language_specific_prompt(language), &prompt)
            .await?;

        let answer = self.language.translate_response(&answer, language).await;
        let answer = post_process(&answer, self.max_sentences);

        let sources = results
            .iter()
            .take(self.max_sources)
            .map(|r| SourceRef::from(&r.metadata))
            .collect();

        Ok(ChatResponse {
            answer,
            sources,
            language,
            original_question: question.to_string(),
            english_question,
            retrieved_docs: results.len(),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LanguageSettings, RagPrompts};
    use crate::embedding::fakes::HashingEmbedder;
    use crate::language::fakes::TaggingTranslator;
    use crate::llm::fakes::ScriptedChatModel;
    use crate::vector_store::{MemoryVectorStore, VectorRecord};

    async fn seeded_store(embedder: &HashingEmbedder) -> Arc<MemoryVectorStore> {
        let store = Arc::new(MemoryVectorStore::new());
        let docs = [
            ("f1_1", "Max Verstappen Profile", "Max Verstappen is a Dutch driver for Red Bull Racing"),
            ("f1_2", "", "DRS drag reduction system opens a rear wing flap"),
        ];
        let mut records = Vec::new();
        for (id, title, text) in docs {
            records.push(VectorRecord {
                id: id.to_string(),
                embedding: embedder.embed(text).await.unwrap(),
                content: text.to_string(),
                metadata: ChunkMetadata {
                    title: title.to_string(),
                    source: "Sample Data".to_string(),
                    ..Default::default()
                },
            });
        }
        store.upsert_batch(&records).await.unwrap();
        store
    }

    async fn engine(llm: Arc<ScriptedChatModel>, translator: Arc<TaggingTranslator>) -> RagEngine {
        let embedder = HashingEmbedder::new(64);
        let store = seeded_store(&embedder).await;
        let language = Arc::new(LanguageHandler::new(
            translator,
            RagPrompts::default(),
            &LanguageSettings::default(),
        ));
        RagEngine::new(store, Arc::new(embedder), language, llm, &RagSettings::default())
    }

    #[tokio::test]
    async fn test_english_query() {
        let llm = Arc::new(ScriptedChatModel::answering(
            "Max Verstappen drives for Red Bull. He is Dutch. He won in 2021. He won in 2022.",
        ));
        let translator = Arc::new(TaggingTranslator::default());
        let engine = engine(llm.clone(), translator.clone()).await;

        let response = engine.query("Which team does Max Verstappen drive for?").await;

        assert!(!response.is_error());
        assert_eq!(response.language, Language::English);
        assert_eq!(response.answer, "Max Verstappen drives for Red Bull. He is Dutch. He won in 2021.");
        assert_eq!(response.english_question, "Which team does Max Verstappen drive for?");
        assert!(response.retrieved_docs >= 1);
        assert_eq!(response.sources[0].title, "Max Verstappen Profile");
        assert_eq!(response.sources[0].doc_type, "text");
        assert!(translator.calls.lock().unwrap().is_empty());

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].0.starts_with("You are an expert Formula 1 assistant"));
        assert!(prompts[0].1.contains("Max Verstappen is a Dutch driver"));
        assert!(prompts[0].1.contains("Question: Which team does Max Verstappen drive for?"));
    }

    #[tokio::test]
    async fn test_hindi_query_uses_hindi_template_and_translates_back() {
        let llm = Arc::new(ScriptedChatModel::answering("DRS opens a flap."));
        let translator = Arc::new(TaggingTranslator::default());
        let engine = engine(llm.clone(), translator.clone()).await;

        let response = engine.query("फॉर्मूला 1 में DRS क्या है?").await;

        assert_eq!(response.language, Language::Hindi);
        assert_eq!(response.english_question, "[en] फॉर्मूला 1 में DRS क्या है?");
        assert_eq!(response.answer, "[hi] DRS opens a flap.");
        assert_eq!(response.original_question, "फॉर्मूला 1 में DRS क्या है?");

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].0.starts_with("आप एक फॉर्मूला 1 विशेषज्ञ सहायक हैं"));
        assert!(prompts[0].1.contains("प्रश्न: [en] फॉर्मूला 1 में DRS क्या है?"));
    }

    #[tokio::test]
    async fn test_llm_failure_returns_localized_apology() {
        let llm = Arc::new(ScriptedChatModel::failing());
        let engine = engine(llm, Arc::new(TaggingTranslator::default())).await;

        let response = engine.query("मैक्लारेन F1 टीम के इतिहास के बारे में बताएं").await;
        assert!(response.is_error());
        assert!(response.answer.starts_with("क्षमा करें"));
        assert!(response.sources.is_empty());
        assert_eq!(response.retrieved_docs, 0);
        assert_eq!(response.english_question, response.original_question);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["language"], "hi");
        assert!(json["error"].as_str().unwrap().contains("rate limited"));
    }

    #[test]
    fn test_source_defaults() {
        let source = SourceRef::from(&ChunkMetadata::default());
        assert_eq!(source.title, "Unknown");
        assert_eq!(source.source, "Unknown");
        assert_eq!(source.url, "");
        assert_eq!(source.doc_type, "text");
    }
}
