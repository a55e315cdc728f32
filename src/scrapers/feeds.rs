//! RSS news feeds.

use super::{HttpFetcher, RawDocument};
use crate::error::{PaddockError, Result};
use rss::Channel;
use scraper::Html;

const ENTRIES_PER_FEED: usize = 10;

pub struct RssScraper {
    http: HttpFetcher,
    feeds: Vec<String>,
}

impl RssScraper {
    pub fn new(http: HttpFetcher, feeds: Vec<String>) -> Self {
        Self { http, feeds }
    }

    /// Latest entries of one feed.
    pub async fn scrape_feed(&self, feed_url: &str) -> Result<Vec<RawDocument>> {
        let body = self.http.get_bytes(feed_url).await?;
        parse_feed(&body, feed_url)
    }

    /// Every configured feed; a broken feed is logged and skipped.
    #[tracing::instrument(skip(self))]
    pub async fn scrape_all(&self) -> Vec<RawDocument> {
        let mut articles = Vec::new();

        for feed_url in &self.feeds {
            tracing::info!("Parsing RSS feed: {}", feed_url);
            match self.scrape_feed(feed_url).await {
                Ok(entries) => articles.extend(entries),
                Err(e) => tracing::warn!("Error parsing RSS feed {}: {}", feed_url, e),
            }
            self.http.pause().await;
        }

        tracing::info!("Scraped {} RSS articles", articles.len());
        articles
    }
}

fn parse_feed(body: &[u8], feed_url: &str) -> Result<Vec<RawDocument>> {
    let channel = Channel::read_from(body)
        .map_err(|e| PaddockError::Scraping(format!("Invalid feed {}: {}", feed_url, e)))?;
    let source = format!("RSS: {}", feed_url);

    Ok(channel
        .items()
        .iter()
        .take(ENTRIES_PER_FEED)
        .map(|item| {
            let title = item.title().unwrap_or_default().trim().to_string();
            let content = item
                .description()
                .map(strip_markup)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| title.clone());

            let mut doc =
                RawDocument::new(&title, &content, item.link().unwrap_or_default(), &source, "news")
                    .scraped_now();
            if let Some(published) = item.pub_date() {
                doc = doc.with_published(published);
            }
            doc
        })
        .collect())
}

/// Feed summaries often carry HTML; keep the text only.
fn strip_markup(html: &str) -> String {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
