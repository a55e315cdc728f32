//! Scrapers for pages that only render with JavaScript: formula1.com news
//! and Motorsport.com season listings.

use super::{absolutize, element_text, first_text, selector, truncate_chars, PageRenderer, RawDocument};
use crate::error::Result;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Listing containers tried in order on formula1.com.
const LISTING_SELECTORS: &[&str] = &[
    ".f1-latest-listing--item",
    ".listing-item",
    ".news-item",
    "article",
    ".card",
];
const TITLE_SELECTORS: &[&str] = &[
    ".f1-latest-listing--item-title",
    ".listing-item--title",
    "h3",
    "h2",
    ".title",
];
const SUMMARY_SELECTORS: &[&str] = &[
    ".f1-latest-listing--item-summary",
    ".listing-item--summary",
    ".summary",
    "p",
];
const MAX_OFFICIAL_ITEMS: usize = 10;

/// A news teaser from the official site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialArticle {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
}

impl OfficialArticle {
    pub fn into_document(self) -> RawDocument {
        RawDocument::new(
            &self.title,
            &format!("{}. {}", self.title, self.description),
            &self.url,
            "F1 Official",
            "news",
        )
        .scraped_now()
    }
}

/// Latest news from formula1.com through a headless browser.
pub struct OfficialScraper {
    renderer: Arc<dyn PageRenderer>,
    base_url: String,
    news_paths: Vec<String>,
    settle: Duration,
}

impl OfficialScraper {
    pub fn new(renderer: Arc<dyn PageRenderer>, base_url: &str, news_paths: Vec<String>) -> Self {
        Self {
            renderer,
            base_url: base_url.trim_end_matches('/').to_string(),
            news_paths,
            settle: Duration::from_secs(3),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Try each news page until one yields articles; fall back to sample items.
    #[tracing::instrument(skip(self))]
    pub async fn scrape_news(&self) -> Vec<OfficialArticle> {
        for path in &self.news_paths {
            let url = format!("{}{}", self.base_url, path);
            tracing::info!("Rendering F1 official page {}", url);

            let html = match self.renderer.render(&url, self.settle).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Could not render {}: {}", url, e);
                    continue;
                }
            };

            match parse_listing(&html, &url, &self.base_url) {
                Ok(articles) if !articles.is_empty() => return articles,
                Ok(_) => tracing::debug!("No articles found on {}", url),
                Err(e) => tracing::warn!("Could not parse {}: {}", url, e),
            }
        }

        tracing::warn!("Using sample F1 official news");
        sample_news(&self.base_url)
    }

    /// Scrape and convert into documents.
    pub async fn scrape_documents(&self) -> Vec<RawDocument> {
        self.scrape_news()
            .await
            .into_iter()
            .map(OfficialArticle::into_document)
            .collect()
    }
}

/// Extract teasers using the first listing selector that yields titled items.
fn parse_listing(html: &str, page_url: &str, base_url: &str) -> Result<Vec<OfficialArticle>> {
    let document = Html::parse_document(html);
    let titles = TITLE_SELECTORS.iter().map(|s| selector(s)).collect::<Result<Vec<_>>>()?;
    let summaries = SUMMARY_SELECTORS.iter().map(|s| selector(s)).collect::<Result<Vec<_>>>()?;
    let link = selector("a")?;
    let title_refs: Vec<_> = titles.iter().collect();
    let summary_refs: Vec<_> = summaries.iter().collect();

    for css in LISTING_SELECTORS {
        let listing = selector(css)?;
        let mut articles = Vec::new();

        for element in document.select(&listing).take(MAX_OFFICIAL_ITEMS) {
            let fallback = element_text(element);
            let title = first_text(element, &title_refs).unwrap_or_else(|| fallback.clone());
            if title.is_empty() {
                continue;
            }
            let description = first_text(element, &summary_refs)
                .or_else(|| Some(fallback.clone()).filter(|t| !t.is_empty()))
                .unwrap_or_else(|| title.clone());
            let url = element
                .select(&link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| absolutize(base_url, href))
                .unwrap_or_else(|| page_url.to_string());

            articles.push(OfficialArticle {
                title,
                description,
                url,
                source: "F1 Official".to_string(),
            });
        }

        if !articles.is_empty() {
            tracing::debug!("Found {} articles with selector {}", articles.len(), css);
            return Ok(articles);
        }
    }

    Ok(Vec::new())
}

fn sample_news(base_url: &str) -> Vec<OfficialArticle> {
    vec![
        OfficialArticle {
            title: "Formula 1 Latest News Update".to_string(),
            description: "Stay updated with the latest Formula 1 news, race results, and driver standings."
                .to_string(),
            url: base_url.to_string(),
            source: "F1 Official (Sample)".to_string(),
        },
        OfficialArticle {
            title: "F1 Championship Update".to_string(),
            description: "Current championship standings and recent race highlights from the Formula 1 season."
                .to_string(),
            url: base_url.to_string(),
            source: "F1 Official (Sample)".to_string(),
        },
    ]
}

/// Listing routes rendered per season.
const RENDERED_ROUTES: &[&str] = &["news", "results", "standings"];
const RENDERED_SELECTOR: &str =
    r#"article, [class*="news-item"], [class*="article"], [class*="listing"], .ms-item, h1, h2, h3"#;
const MAX_RENDERED_ELEMENTS: usize = 20;

/// Headline-like text from rendered Motorsport.com season listings.
pub struct RenderedMotorsportScraper {
    renderer: Arc<dyn PageRenderer>,
    base_url: String,
    settle: Duration,
}

impl RenderedMotorsportScraper {
    pub fn new(renderer: Arc<dyn PageRenderer>, base_url: &str) -> Self {
        Self {
            renderer,
            base_url: base_url.trim_end_matches('/').to_string(),
            settle: Duration::from_secs(2),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Render every route for one season.
    pub async fn scrape_year(&self, year: i32) -> Vec<RawDocument> {
        let mut documents = Vec::new();

        for route in RENDERED_ROUTES {
            let url = format!("{}/f1/{}/{}", self.base_url, route, year);
            let html = match self.renderer.render(&url, self.settle).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Could not render {}: {}", url, e);
                    continue;
                }
            };

            match parse_rendered_listing(&html, &url, route, year) {
                Ok(docs) => {
                    tracing::info!("Scraped {} items from {}", docs.len(), url);
                    documents.extend(docs);
                }
                Err(e) => tracing::warn!("Could not parse {}: {}", url, e),
            }
        }

        documents
    }
}

fn parse_rendered_listing(html: &str, page_url: &str, route: &str, year: i32) -> Result<Vec<RawDocument>> {
    let document = Html::parse_document(html);
    let elements = selector(RENDERED_SELECTOR)?;

    Ok(document
        .select(&elements)
        .take(MAX_RENDERED_ELEMENTS)
        .map(element_text)
        .filter(|text| text.chars().count() > 15)
        .map(|text| {
            RawDocument::new(
                &truncate_chars(&text, 200),
                &truncate_chars(&text, 500),
                page_url,
                "Motorsport.com Rendered",
                route,
            )
            .with_year(year)
            .scraped_now()
        })
        .collect())
}
