//! Encyclopedia articles from the MediaWiki extracts API.

use super::{HttpFetcher, RawDocument, Section};
use crate::error::{PaddockError, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    pageprops: Option<serde_json::Value>,
}

impl Page {
    fn is_disambiguation(&self) -> bool {
        self.pageprops
            .as_ref()
            .map(|props| props.get("disambiguation").is_some())
            .unwrap_or(false)
    }
}

/// Scraper for a fixed list of F1 encyclopedia topics.
pub struct WikipediaScraper {
    http: HttpFetcher,
    api_url: String,
    topics: Vec<String>,
}

impl WikipediaScraper {
    pub fn new(http: HttpFetcher, api_url: &str, topics: Vec<String>) -> Self {
        Self {
            http,
            api_url: api_url.to_string(),
            topics,
        }
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Fetch one article with its summary and sections.
    pub async fn scrape_page(&self, topic: &str) -> Result<RawDocument> {
        let query = [
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("formatversion", "2".to_string()),
            ("prop", "extracts|info|pageprops".to_string()),
            ("inprop", "url".to_string()),
            ("explaintext", "1".to_string()),
            ("redirects", "1".to_string()),
            ("titles", topic.to_string()),
        ];

        let response: QueryResponse = self.http.get_json(&self.api_url, &query).await?;
        let page = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| PaddockError::Scraping(format!("No page returned for '{}'", topic)))?;

        if page.missing {
            return Err(PaddockError::Scraping(format!("Page '{}' does not exist", topic)));
        }
        if page.is_disambiguation() {
            return Err(PaddockError::Scraping(format!(
                "'{}' is a disambiguation page",
                topic
            )));
        }

        let content = page.extract.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(PaddockError::Scraping(format!("Page '{}' has no text", topic)));
        }

        let url = page.fullurl.unwrap_or_else(|| {
            format!("https://en.wikipedia.org/wiki/{}", page.title.replace(' ', "_"))
        });

        Ok(RawDocument::new(&page.title, &content, &url, "Wikipedia", "encyclopedia")
            .with_summary(&extract_summary(&content))
            .with_sections(parse_sections(&content))
            .scraped_now())
    }

    /// Scrape every configured topic, skipping the ones that fail.
    #[tracing::instrument(skip(self))]
    pub async fn scrape_all(&self) -> Vec<RawDocument> {
        let mut documents = Vec::new();

        for topic in &self.topics {
            tracing::info!("Scraping Wikipedia: {}", topic);
            match self.scrape_page(topic).await {
                Ok(doc) => documents.push(doc),
                Err(e) => tracing::warn!("Skipping Wikipedia page '{}': {}", topic, e),
            }
            self.http.pause().await;
        }

        tracing::info!("Scraped {} Wikipedia pages", documents.len());
        documents
    }
}

/// Intro text before the first heading.
fn extract_summary(content: &str) -> String {
    content
        .lines()
        .take_while(|line| !line.starts_with('='))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split plain-text article content on `==` headings.
///
/// Body lines are joined with spaces. Text before the first heading belongs
/// to the summary and is not a section. A heading only opens a new section
/// once the current one has text.
fn parse_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current_section = String::new();
    let mut current_content = String::new();

    for line in content.lines() {
        if line.starts_with('=') {
            // Subheadings directly under a heading stay in the parent section
            if current_content.trim().is_empty() {
                continue;
            }
            if !current_section.is_empty() {
                sections.push(Section::new(&current_section, current_content.trim()));
            }
            current_section = line.trim_matches(|c| c == '=' || c == ' ').to_string();
            current_content.clear();
        } else if !line.trim().is_empty() {
            current_content.push_str(line);
            current_content.push(' ');
        }
    }

    if !current_section.is_empty() && !current_content.trim().is_empty() {
        sections.push(Section::new(&current_section, current_content.trim()));
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapingSettings;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE: &str = "Max Verstappen is a Dutch racing driver.\nHe drives for Red Bull.\n\n== Early life ==\nBorn in Hasselt.\nSon of Jos.\n\n== Formula One career ==\n=== Toro Rosso ===\nDebuted in 2015.\n\n== Helmet ==\n";

    fn fetcher() -> HttpFetcher {
        let settings = ScrapingSettings {
            request_delay_ms: 0,
            ..Default::default()
        };
        HttpFetcher::new(&settings).unwrap()
    }

    #[test]
    fn test_summary_stops_at_first_heading() {
        assert_eq!(
            extract_summary(ARTICLE),
            "Max Verstappen is a Dutch racing driver.\nHe drives for Red Bull."
        );
    }

    #[test]
    fn test_parse_sections() {
        let sections = parse_sections(ARTICLE);
        assert_eq!(
            sections,
            vec![
                Section::new("Early life", "Born in Hasselt. Son of Jos."),
                Section::new("Formula One career", "Debuted in 2015."),
            ]
        );
    }

    #[test]
    fn test_nested_heading_keeps_parent_section() {
        let sections = parse_sections("Intro.\n== Career ==\n=== 2015 ===\nDebut.\n== Helmet ==\nRed.\n");
        assert_eq!(
            sections,
            vec![Section::new("Career", "Debut."), Section::new("Helmet", "Red.")]
        );
    }

    #[tokio::test]
    async fn test_scrape_page() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "query": {"pages": [{
                "title": "Max Verstappen",
                "extract": ARTICLE,
                "fullurl": "https://en.wikipedia.org/wiki/Max_Verstappen"
            }]}
        });
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", "Max Verstappen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let scraper = WikipediaScraper::new(
            fetcher(),
            &format!("{}/w/api.php", server.uri()),
            vec!["Max Verstappen".to_string()],
        );
        let doc = scraper.scrape_page("Max Verstappen").await.unwrap();

        assert_eq!(doc.title, "Max Verstappen");
        assert_eq!(doc.url, "https://en.wikipedia.org/wiki/Max_Verstappen");
        assert_eq!(doc.source, "Wikipedia");
        assert_eq!(doc.doc_type, "encyclopedia");
        assert_eq!(doc.sections.len(), 2);
        assert!(doc.summary.unwrap().starts_with("Max Verstappen is"));
    }

    #[tokio::test]
    async fn test_scrape_all_skips_missing_and_disambiguation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("titles", "McLaren"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"pages": [{"title": "McLaren", "extract": "May refer to", "pageprops": {"disambiguation": ""}}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("titles", "Nope"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"pages": [{"title": "Nope", "missing": true}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("titles", "Formula One"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"pages": [{"title": "Formula One", "extract": "Formula One is the highest class."}]}
            })))
            .mount(&server)
            .await;

        let scraper = WikipediaScraper::new(
            fetcher(),
            &server.uri(),
            vec!["McLaren".to_string(), "Nope".to_string(), "Formula One".to_string()],
        );
        let docs = scraper.scrape_all().await;

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].url, "https://en.wikipedia.org/wiki/Formula_One");
        assert!(docs[0].sections.is_empty());
    }
}
