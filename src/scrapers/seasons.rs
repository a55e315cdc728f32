//! Multi-season scraping with bounded fan-out over years.

use super::{dedupe_by_title_and_year, historical_documents, NewsScraper, RawDocument, RenderedMotorsportScraper};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Below this many unique articles the historical facts are added.
const MIN_ARTICLES: usize = 10;

/// Scrapes news, standings and schedules for a range of seasons.
pub struct SeasonScraper {
    news: Arc<NewsScraper>,
    rendered: Option<Arc<RenderedMotorsportScraper>>,
}

impl SeasonScraper {
    pub fn new(news: Arc<NewsScraper>) -> Self {
        Self { news, rendered: None }
    }

    /// Also render the JavaScript season listings for each year.
    pub fn with_rendered(mut self, rendered: Arc<RenderedMotorsportScraper>) -> Self {
        self.rendered = Some(rendered);
        self
    }

    /// Everything scraped for one season.
    pub async fn scrape_year(&self, year: i32) -> Vec<RawDocument> {
        let mut documents = self.news.season_news(year).await;
        self.news.http().pause().await;

        documents.extend(self.news.season_standings(year).await);
        self.news.http().pause().await;

        documents.extend(self.news.season_schedule(year).await);
        self.news.http().pause().await;

        if let Some(rendered) = &self.rendered {
            documents.extend(rendered.scrape_year(year).await);
        }

        documents
    }

    /// Scrape `start..=end` with at most `workers` seasons in flight, deduplicated.
    #[tracing::instrument(skip(self))]
    pub async fn scrape(&self, start: i32, end: i32, workers: usize) -> Vec<RawDocument> {
        let workers = workers.max(1);
        tracing::info!("Starting multi-season scrape {}-{} with {} workers", start, end, workers);

        let per_year: Vec<(i32, Vec<RawDocument>)> = stream::iter(start..=end)
            .map(|year| async move { (year, self.scrape_year(year).await) })
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut all = Vec::new();
        for (year, docs) in per_year {
            tracing::info!("Completed {}: {} articles", year, docs.len());
            all.extend(docs);
        }

        let mut unique = dedupe_by_title_and_year(all);
        tracing::info!("Total articles across all seasons: {}", unique.len());

        if unique.len() < MIN_ARTICLES {
            tracing::warn!("Low article count, adding historical content");
            unique.extend(historical_documents());
        }

        unique
    }
}
