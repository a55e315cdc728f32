//! Chunking of scraped documents into token-bounded, retrievable pieces.
//!
//! Every chunk carries the metadata of the document it came from, so a
//! retrieved chunk can be cited without looking the document up again.

mod splitter;
mod tokens;

pub use splitter::{RecursiveSplitter, DEFAULT_SEPARATORS};
pub use tokens::{TiktokenCounter, TokenCounter};

use crate::config::ChunkingSettings;
use crate::error::Result;
use crate::scrapers::RawDocument;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A bounded slice of a document, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic id derived from the document URL.
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Metadata stored next to each chunk in the vector index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkMetadata {
    pub source: String,
    pub url: String,
    pub title: String,
    #[serde(deserialize_with = "lenient_usize")]
    pub chunk_index: usize,
    /// Number of chunks produced from the same text unit.
    #[serde(deserialize_with = "lenient_usize")]
    pub total_chunks: usize,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub language: String,
    pub section: String,
    #[serde(deserialize_with = "lenient_usize")]
    pub token_count: usize,
}

/// Hosted indexes hand numeric metadata back as floats or strings.
fn lenient_usize<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0) as usize,
        serde_json::Value::String(s) => s.trim().parse::<f64>().map(|f| f.max(0.0) as usize).unwrap_or(0),
        _ => 0,
    })
}

/// Splits documents and attaches metadata.
pub struct TextChunker {
    splitter: RecursiveSplitter,
}

impl TextChunker {
    /// Build a chunker from settings, loading the configured tokenizer.
    pub fn new(settings: &ChunkingSettings) -> Result<Self> {
        let counter = Arc::new(TiktokenCounter::new(&settings.encoding)?);
        Self::with_counter(settings.chunk_size, settings.chunk_overlap, counter)
    }

    /// Build a chunker with an explicit length function.
    pub fn with_counter(
        chunk_size: usize,
        chunk_overlap: usize,
        counter: Arc<dyn TokenCounter>,
    ) -> Result<Self> {
        Ok(Self {
            splitter: RecursiveSplitter::new(chunk_size, chunk_overlap, counter)?,
        })
    }

    /// Token count under the chunker's length function.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.splitter.length(text)
    }

    /// Chunk a regular document as `"Title: {title}\n\n{content}"`.
    pub fn chunk_document(&self, doc: &RawDocument) -> Vec<Chunk> {
        let text = format!("Title: {}\n\n{}", doc.title, doc.content);
        let id_base = if doc.url.is_empty() { "unknown" } else { doc.url.as_str() };
        let section = doc.section.clone().unwrap_or_default();

        self.build_chunks(&text, |i| format!("{}_{}", id_base, i), |index, total, token_count| {
            ChunkMetadata {
                source: doc.source.clone(),
                url: doc.url.clone(),
                title: doc.title.clone(),
                chunk_index: index,
                total_chunks: total,
                doc_type: doc.doc_type.clone(),
                language: doc.language.clone(),
                section: section.clone(),
                token_count,
            }
        })
    }

    /// Chunk an encyclopedia article by its summary and sections.
    pub fn chunk_wikipedia_sections(&self, doc: &RawDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let source = if doc.source.is_empty() { "Wikipedia" } else { doc.source.as_str() };

        let metadata = |section: &str, doc_type: &str| {
            let section = section.to_string();
            let doc_type = doc_type.to_string();
            move |index: usize, total: usize, token_count: usize| ChunkMetadata {
                source: source.to_string(),
                url: doc.url.clone(),
                title: doc.title.clone(),
                chunk_index: index,
                total_chunks: total,
                doc_type: doc_type.clone(),
                language: "en".to_string(),
                section: section.clone(),
                token_count,
            }
        };

        if let Some(summary) = doc.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            let text = format!("Title: {}\n\nSummary: {}", doc.title, summary);
            chunks.extend(self.build_chunks(
                &text,
                |i| format!("{}_summary_{}", doc.url, i),
                metadata("Summary", "encyclopedia_summary"),
            ));
        }

        for (section_idx, section) in doc.sections.iter().enumerate() {
            if section.content.trim().is_empty() {
                continue;
            }
            let name = if section.section.is_empty() {
                format!("Section_{}", section_idx)
            } else {
                section.section.clone()
            };

            let text = format!("Title: {}\nSection: {}\n\n{}", doc.title, name, section.content);
            chunks.extend(self.build_chunks(
                &text,
                |i| format!("{}_section_{}_{}", doc.url, section_idx, i),
                metadata(&name, "encyclopedia_section"),
            ));
        }

        chunks
    }

    /// Chunk a batch, routing sectioned encyclopedia articles to the section path.
    pub fn process_documents(&self, docs: &[RawDocument]) -> Vec<Chunk> {
        let mut all_chunks = Vec::new();

        for doc in docs {
            let chunks = if doc.source == "Wikipedia" && !doc.sections.is_empty() {
                self.chunk_wikipedia_sections(doc)
            } else {
                self.chunk_document(doc)
            };

            if chunks.is_empty() {
                tracing::warn!(title = %doc.title, "Document produced no chunks, skipping");
                continue;
            }
            all_chunks.extend(chunks);
        }

        tracing::info!("Created {} chunks from {} documents", all_chunks.len(), docs.len());
        all_chunks
    }

    fn build_chunks<I, M>(&self, text: &str, make_id: I, make_metadata: M) -> Vec<Chunk>
    where
        I: Fn(usize) -> String,
        M: Fn(usize, usize, usize) -> ChunkMetadata,
    {
        let pieces = self.splitter.split_text(text);
        let total = pieces.len();

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, content)| {
                let token_count = self.splitter.length(&content);
                Chunk {
                    id: make_id(i),
                    metadata: make_metadata(i, total, token_count),
                    content,
                }
            })
            .collect()
    }
}
