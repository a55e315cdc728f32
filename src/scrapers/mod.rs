//! Content scrapers for Formula 1 sources.
//!
//! Every scraper produces [`RawDocument`]s. Scrapers are best effort: a
//! source that fails is logged and contributes nothing, so one broken site
//! never aborts an ingestion run.

mod browser;
mod feeds;
mod news;
mod official;
mod openf1;
mod seasons;
mod wikipedia;

pub use browser::{BrowserRenderer, PageRenderer};
pub use feeds::RssScraper;
pub use news::NewsScraper;
pub use official::{OfficialArticle, OfficialScraper, RenderedMotorsportScraper};
pub use openf1::{Driver, Meeting, OpenF1Client, OpenF1Data, RaceResult, Session};
pub use seasons::SeasonScraper;
pub use wikipedia::WikipediaScraper;

use crate::config::ScrapingSettings;
use crate::error::{PaddockError, Result};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Selector};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// A document as produced by a scraper, before chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub title: String,
    pub content: String,
    pub url: String,
    pub source: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub language: String,
    /// Intro text (encyclopedia articles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Headed sections (encyclopedia articles).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    /// Section name carried into chunk metadata for regular documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Season, or `multiple` for cross-season content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl RawDocument {
    /// Create an English document.
    pub fn new(title: &str, content: &str, url: &str, source: &str, doc_type: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            url: url.to_string(),
            source: source.to_string(),
            doc_type: doc_type.to_string(),
            language: "en".to_string(),
            summary: None,
            sections: Vec::new(),
            section: None,
            year: None,
            published: None,
            scraped_at: None,
        }
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_year(mut self, year: impl ToString) -> Self {
        self.year = Some(year.to_string());
        self
    }

    pub fn with_published(mut self, published: &str) -> Self {
        self.published = Some(published.to_string());
        self
    }

    /// Stamp the document with the current time.
    pub fn scraped_now(mut self) -> Self {
        self.scraped_at = Some(Utc::now());
        self
    }
}

/// A headed section of an encyclopedia article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section: String,
    pub content: String,
}

impl Section {
    pub fn new(section: &str, content: &str) -> Self {
        Self {
            section: section.to_string(),
            content: content.to_string(),
        }
    }
}

/// Shared HTTP client for scrapers.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    delay: Duration,
}

impl HttpFetcher {
    /// Build a client with the configured user agent and timeout.
    pub fn new(settings: &ScrapingSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| PaddockError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            delay: Duration::from_millis(settings.request_delay_ms),
        })
    }

    /// GET a page body, failing on non-success status.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// GET raw bytes, failing on non-success status.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        tracing::debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Politeness delay between requests to the same source.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Parse a CSS selector, mapping failures into a scraping error.
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PaddockError::Scraping(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant matching one of `selectors`, tried in order.
pub(crate) fn first_text(element: ElementRef<'_>, selectors: &[&Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        element
            .select(sel)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

/// Resolve `href` against `base`, keeping already absolute links.
pub(crate) fn absolutize(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    url::Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}{}", base.trim_end_matches('/'), href))
}

/// Truncate to at most `max` characters.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Drop documents whose lowercased title was already seen.
pub fn dedupe_by_title(docs: Vec<RawDocument>) -> Vec<RawDocument> {
    let mut seen = HashSet::new();
    docs.into_iter()
        .filter(|doc| seen.insert(doc.title.to_lowercase()))
        .collect()
}

/// Drop documents whose lowercased title and year were already seen.
pub fn dedupe_by_title_and_year(docs: Vec<RawDocument>) -> Vec<RawDocument> {
    let mut seen = HashSet::new();
    docs.into_iter()
        .filter(|doc| {
            let key = format!("{}_{}", doc.title.to_lowercase(), doc.year.as_deref().unwrap_or(""));
            seen.insert(key)
        })
        .collect()
}

/// Always-available historical facts used when a scrape comes back thin.
pub fn historical_documents() -> Vec<RawDocument> {
    [
        (
            "Lewis Hamilton Championship Years",
            "Lewis Hamilton won Formula 1 World Championships in 2008, 2014, 2015, 2017, 2018, 2019, and 2020, making him one of the most successful drivers in F1 history.",
        ),
        (
            "Sebastian Vettel Red Bull Era",
            "Sebastian Vettel dominated Formula 1 from 2010-2013, winning four consecutive championships with Red Bull Racing during their most successful period.",
        ),
    ]
    .iter()
    .map(|(title, content)| {
        RawDocument::new(title, content, "historical_data", "Historical F1 Data", "historical")
            .with_year("multiple")
            .scraped_now()
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_element_text_collapses_whitespace() {
        let html = Html::parse_fragment("<div><h3>  Verstappen \n wins </h3><p>in <b>Suzuka</b></p></div>");
        let div = html.select(&selector("div").unwrap()).next().unwrap();
        assert_eq!(element_text(div), "Verstappen wins in Suzuka");
    }

    #[test]
    fn test_first_text_tries_selectors_in_order() {
        let html = Html::parse_fragment("<div><p>Summary</p><h2>Headline</h2></div>");
        let div = html.select(&selector("div").unwrap()).next().unwrap();
        let h3 = selector("h3").unwrap();
        let h2 = selector("h2").unwrap();
        let p = selector("p").unwrap();
        assert_eq!(first_text(div, &[&h3, &h2, &p]).as_deref(), Some("Headline"));
        assert_eq!(first_text(div, &[&h3]), None);
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("https://www.formula1.com", "/en/latest/article.abc"),
            "https://www.formula1.com/en/latest/article.abc"
        );
        assert_eq!(
            absolutize("https://www.motorsport.com/f1/news/", "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_dedupe_by_title_is_case_insensitive() {
        let docs = vec![
            RawDocument::new("Hamilton joins Ferrari", "a", "u1", "s", "news"),
            RawDocument::new("HAMILTON JOINS FERRARI", "b", "u2", "s", "news"),
            RawDocument::new("Norris wins Miami", "c", "u3", "s", "news"),
        ];
        let unique = dedupe_by_title(docs);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].content, "a");
    }

    #[test]
    fn test_dedupe_by_title_and_year_keeps_other_seasons() {
        let docs = vec![
            RawDocument::new("Standings", "a", "u", "s", "standings").with_year(2023),
            RawDocument::new("standings", "b", "u", "s", "standings").with_year(2024),
            RawDocument::new("Standings", "c", "u", "s", "standings").with_year(2023),
        ];
        let unique = dedupe_by_title_and_year(docs);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[1].year.as_deref(), Some("2024"));
    }

    #[test]
    fn test_historical_documents() {
        let docs = historical_documents();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.url == "historical_data" && d.doc_type == "historical"));
        assert!(docs[0].content.contains("2008"));
    }

    #[test]
    fn test_raw_document_json_uses_type_key() {
        let doc = RawDocument::new("T", "C", "U", "S", "news");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "news");
        assert!(json.get("sections").is_none());
    }
}
