//! Ingestion pipeline for Paddock.
//!
//! Coordinates scraping, chunking, embedding and upserting into the index,
//! and builds the RAG engine over the same components.

use crate::chunking::{Chunk, ChunkMetadata, TextChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{PaddockError, Result};
use crate::language::{LanguageHandler, Translator};
use crate::llm::ChatModel;
use crate::rag::RagEngine;
use crate::scrapers::{
    dedupe_by_title, BrowserRenderer, HttpFetcher, NewsScraper, OfficialScraper, OpenF1Client,
    PageRenderer, RawDocument, RenderedMotorsportScraper, RssScraper, SeasonScraper,
    WikipediaScraper,
};
use crate::vector_store::{create_vector_store, SearchResult, VectorRecord, VectorStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Sources reported by a full knowledge base update.
pub const UPDATE_SOURCES: [&str; 3] = ["Wikipedia", "F1 Official", "OpenF1 API"];

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
    pub scraped_documents: usize,
    pub created_chunks: usize,
    pub sources: Vec<String>,
}

/// An article submitted for bulk ingestion. Missing fields get defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "type")]
    pub doc_type: Option<String>,
    /// Number or string.
    #[serde(default)]
    pub year: Option<serde_json::Value>,
    #[serde(default)]
    pub published: Option<String>,
}

impl BulkArticle {
    /// Normalize into an English document.
    pub fn into_document(self, default_year: i32) -> RawDocument {
        let year = match self.year {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => default_year.to_string(),
        };

        let mut doc = RawDocument::new(
            self.title.as_deref().unwrap_or_default(),
            self.content.as_deref().unwrap_or_default(),
            self.url.as_deref().unwrap_or_default(),
            self.source.as_deref().unwrap_or("Motorsport.com"),
            self.doc_type.as_deref().unwrap_or("news"),
        )
        .with_year(year)
        .scraped_now();

        if let Some(published) = self.published.as_deref() {
            doc = doc.with_published(published);
        }
        doc
    }
}

/// The main orchestrator for the Paddock pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    renderer: Arc<dyn PageRenderer>,
    chunker: TextChunker,
    http: HttpFetcher,
}

impl Orchestrator {
    /// Create an orchestrator from settings, connecting to the configured index.
    pub async fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(&settings.embedding)?);
        let vector_store = create_vector_store(&settings).await?;
        let renderer: Arc<dyn PageRenderer> = Arc::new(BrowserRenderer::new(
            settings.scraping.headless,
            &settings.scraping.user_agent,
            Duration::from_secs(settings.scraping.timeout_seconds),
        ));

        Self::with_components(settings, prompts, embedder, vector_store, renderer)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self> {
        let chunker = TextChunker::new(&settings.chunking)?;
        let http = HttpFetcher::new(&settings.scraping)?;

        Ok(Self {
            settings,
            prompts,
            embedder,
            vector_store,
            renderer,
            chunker,
            http,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Build a RAG engine over this orchestrator's index.
    pub fn rag_engine(&self, llm: Arc<dyn ChatModel>, translator: Arc<dyn Translator>) -> RagEngine {
        let language = Arc::new(LanguageHandler::new(
            translator,
            self.prompts.rag.clone(),
            &self.settings.language,
        ));

        RagEngine::new(
            self.vector_store.clone(),
            self.embedder.clone(),
            language,
            llm,
            &self.settings.rag,
        )
        .with_prompts(self.prompts.clone())
    }

    /// Embed and upsert chunks. Returns the number of records written.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn index_chunks(&self, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(PaddockError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord::from_chunk(chunk, embedding))
            .collect();

        let written = self.vector_store.upsert_batch(&records).await?;
        info!("Upserted {} chunks", written);
        Ok(written)
    }

    /// Chunk documents and index them.
    pub async fn index_documents(&self, documents: &[RawDocument]) -> Result<UpdateReport> {
        let chunks = self.chunker.process_documents(documents);
        let created_chunks = chunks.len();
        self.index_chunks(chunks).await?;

        Ok(UpdateReport {
            scraped_documents: documents.len(),
            created_chunks,
            sources: Vec::new(),
        })
    }

    /// Rebuild the knowledge base from Wikipedia, the official site and OpenF1.
    #[instrument(skip(self))]
    pub async fn scrape_and_update(&self) -> Result<UpdateReport> {
        let scraping = &self.settings.scraping;
        let mut documents = Vec::new();

        let wikipedia = WikipediaScraper::new(
            self.http.clone(),
            &scraping.wikipedia_api_url,
            scraping.wikipedia_topics.clone(),
        );
        documents.extend(wikipedia.scrape_all().await);

        let official = OfficialScraper::new(
            self.renderer.clone(),
            &scraping.official_base_url,
            scraping.official_news_paths.clone(),
        );
        documents.extend(official.scrape_documents().await);

        let openf1 = OpenF1Client::new(self.http.clone(), &scraping.openf1_base_url);
        let data = openf1.comprehensive_data(scraping.season).await;
        documents.extend(openf1.format_for_rag(&data));

        if documents.is_empty() {
            return Err(PaddockError::Scraping("No documents were scraped".to_string()));
        }
        info!("Scraped {} documents", documents.len());

        let mut report = self.index_documents(&documents).await?;
        report.sources = UPDATE_SOURCES.iter().map(|s| s.to_string()).collect();
        Ok(report)
    }

    /// Normalize and index externally supplied articles.
    #[instrument(skip(self, articles), fields(count = articles.len()))]
    pub async fn bulk_add(&self, articles: Vec<BulkArticle>) -> Result<UpdateReport> {
        if articles.is_empty() {
            return Err(PaddockError::InvalidInput("No articles provided".to_string()));
        }

        let season = self.settings.scraping.season;
        let documents: Vec<RawDocument> = articles
            .into_iter()
            .map(|article| article.into_document(season))
            .collect();

        self.index_documents(&documents).await
    }

    /// Refresh current news from the HTML news sites and RSS feeds.
    #[instrument(skip(self))]
    pub async fn refresh_news(&self) -> Result<UpdateReport> {
        let scraping = &self.settings.scraping;
        let news = NewsScraper::new(self.http.clone(), scraping);
        let mut documents = Vec::new();

        documents.extend(news.motorsport_news().await);
        self.http.pause().await;
        documents.extend(news.autosport_news().await);
        self.http.pause().await;
        documents.extend(news.f1nsight().await);
        self.http.pause().await;
        documents.extend(news.standings().await);
        self.http.pause().await;
        documents.extend(news.schedule().await);

        let rss = RssScraper::new(self.http.clone(), scraping.rss_feeds.clone());
        documents.extend(rss.scrape_all().await);

        let documents = dedupe_by_title(documents);
        if documents.is_empty() {
            return Err(PaddockError::Scraping("No news could be scraped".to_string()));
        }
        info!("Collected {} unique articles", documents.len());

        let mut report = self.index_documents(&documents).await?;
        report.sources = unique_sources(&documents);
        Ok(report)
    }

    /// Scrape and index a range of seasons with bounded parallelism.
    #[instrument(skip(self))]
    pub async fn multi_season(
        &self,
        start: i32,
        end: i32,
        workers: usize,
        rendered: bool,
    ) -> Result<UpdateReport> {
        if start > end {
            return Err(PaddockError::InvalidInput(format!(
                "Start year {} is after end year {}",
                start, end
            )));
        }

        let news = Arc::new(NewsScraper::new(self.http.clone(), &self.settings.scraping));
        let mut seasons = SeasonScraper::new(news);
        if rendered {
            seasons = seasons.with_rendered(Arc::new(RenderedMotorsportScraper::new(
                self.renderer.clone(),
                &self.settings.scraping.motorsport_base_url,
            )));
        }

        let documents = seasons.scrape(start, end, workers).await;
        let mut report = self.index_documents(&documents).await?;
        report.sources = unique_sources(&documents);
        Ok(report)
    }

    /// Upload a few known facts and check they can be found again.
    #[instrument(skip(self))]
    pub async fn seed_samples(&self) -> Result<Vec<SearchResult>> {
        let chunks = self.sample_chunks();
        let written = self.index_chunks(chunks).await?;
        info!("Uploaded {} sample chunks", written);

        let query = self.embedder.embed("Max Verstappen").await?;
        let results = self.vector_store.search(&query, 2).await?;
        if results.is_empty() {
            warn!("Sample search returned no results");
        }
        Ok(results)
    }

    fn sample_chunks(&self) -> Vec<Chunk> {
        [
            (
                "f1_sample_1",
                "Max Verstappen Profile",
                "driver_profile",
                "Max Verstappen is a Dutch Formula 1 racing driver who currently competes for Red Bull Racing. He won the Formula 1 World Drivers Championship in 2021, 2022, and 2023.",
            ),
            (
                "f1_sample_2",
                "2025 F1 Season",
                "season_info",
                "The 2025 Formula 1 World Championship features 24 races across different continents. The season includes classic circuits like Monaco, Silverstone, and Spa-Francorchamps.",
            ),
            (
                "f1_sample_3",
                "Lewis Hamilton Profile",
                "driver_profile",
                "Lewis Hamilton is a British Formula 1 driver who has won seven World Championships. He currently drives for Mercedes and holds multiple F1 records.",
            ),
        ]
        .iter()
        .map(|(id, title, doc_type, text)| Chunk {
            id: id.to_string(),
            content: text.to_string(),
            metadata: ChunkMetadata {
                source: "Sample Data".to_string(),
                url: String::new(),
                title: title.to_string(),
                chunk_index: 0,
                total_chunks: 1,
                doc_type: doc_type.to_string(),
                language: "en".to_string(),
                section: String::new(),
                token_count: self.chunker.count_tokens(text),
            },
        })
        .collect()
    }
}

fn unique_sources(documents: &[RawDocument]) -> Vec<String> {
    let mut sources: Vec<String> = documents.iter().map(|d| d.source.clone()).collect();
    sources.sort();
    sources.dedup();
    sources
}

/// Timestamp used in status responses.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}
