//! Static HTML news sites: Motorsport.com, Autosport.com and F1nsight.

use super::{absolutize, element_text, selector, HttpFetcher, RawDocument};
use crate::config::ScrapingSettings;
use crate::error::Result;
use scraper::{ElementRef, Html};

const MAX_NEWS_ITEMS: usize = 15;
const MAX_SCHEDULE_ITEMS: usize = 24;
const MAX_SEASON_RACES: usize = 20;

/// Season-independent and per-season scrapers for HTML news pages.
pub struct NewsScraper {
    http: HttpFetcher,
    motorsport_base: String,
    autosport_base: String,
    f1nsight_url: String,
    season: i32,
}

impl NewsScraper {
    pub fn new(http: HttpFetcher, settings: &ScrapingSettings) -> Self {
        Self {
            http,
            motorsport_base: settings.motorsport_base_url.trim_end_matches('/').to_string(),
            autosport_base: settings.autosport_base_url.trim_end_matches('/').to_string(),
            f1nsight_url: settings.f1nsight_url.clone(),
            season: settings.season,
        }
    }

    pub fn http(&self) -> &HttpFetcher {
        &self.http
    }

    /// Fetch a page and parse it, logging and swallowing failures.
    async fn scrape<F>(&self, label: &str, url: &str, parse: F) -> Vec<RawDocument>
    where
        F: FnOnce(&str, &str) -> Result<Vec<RawDocument>>,
    {
        tracing::info!("Scraping {}", label);
        let result = match self.http.get_text(url).await {
            Ok(html) => parse(&html, url),
            Err(e) => Err(e),
        };

        match result {
            Ok(docs) => {
                tracing::info!("Scraped {} items from {}", docs.len(), label);
                docs
            }
            Err(e) => {
                tracing::warn!("Error scraping {}: {}", label, e);
                Vec::new()
            }
        }
    }

    pub async fn motorsport_news(&self) -> Vec<RawDocument> {
        let url = format!("{}/f1/news/", self.motorsport_base);
        self.scrape("Motorsport.com news", &url, parse_motorsport_news).await
    }

    pub async fn autosport_news(&self) -> Vec<RawDocument> {
        let url = format!("{}/f1/news/", self.autosport_base);
        self.scrape("Autosport.com news", &url, parse_autosport_news).await
    }

    pub async fn f1nsight(&self) -> Vec<RawDocument> {
        self.scrape("F1nsight.com", &self.f1nsight_url, parse_f1nsight).await
    }

    pub async fn standings(&self) -> Vec<RawDocument> {
        let url = format!("{}/f1/standings/{}/", self.motorsport_base, self.season);
        let season = self.season;
        self.scrape("standings", &url, |html, url| parse_standings(html, url, season))
            .await
    }

    pub async fn schedule(&self) -> Vec<RawDocument> {
        let url = format!("{}/f1/schedule/{}/", self.motorsport_base, self.season);
        let season = self.season;
        self.scrape("race schedule", &url, |html, url| parse_schedule(html, url, season))
            .await
    }

    pub async fn season_news(&self, year: i32) -> Vec<RawDocument> {
        let url = format!("{}/f1/news/{}", self.motorsport_base, year);
        self.scrape(&format!("Motorsport.com {}", year), &url, |html, url| {
            parse_season_news(html, url, year)
        })
        .await
    }

    pub async fn season_standings(&self, year: i32) -> Vec<RawDocument> {
        let url = format!("{}/f1/standings/{}/", self.motorsport_base, year);
        self.scrape(&format!("{} standings", year), &url, |html, url| {
            parse_season_standings(html, url, year)
        })
        .await
    }

    pub async fn season_schedule(&self, year: i32) -> Vec<RawDocument> {
        let url = format!("{}/f1/schedule/{}/", self.motorsport_base, year);
        self.scrape(&format!("{} schedule", year), &url, |html, url| {
            parse_season_schedule(html, url, year)
        })
        .await
    }
}

fn is_link(element: ElementRef<'_>) -> bool {
    element.value().name() == "a"
}

fn news_document(title: &str, summary: Option<String>, url: &str, source: &str) -> RawDocument {
    let summary = summary.unwrap_or_else(|| title.to_string());
    RawDocument::new(title, &format!("{}. {}", title, summary), url, source, "news").scraped_now()
}

fn link_of(element: ElementRef<'_>, page_url: &str) -> String {
    element
        .value()
        .attr("href")
        .filter(|href| !href.is_empty())
        .map(|href| absolutize(page_url, href))
        .unwrap_or_else(|| page_url.to_string())
}

fn parse_motorsport_news(html: &str, page_url: &str) -> Result<Vec<RawDocument>> {
    let document = Html::parse_document(html);
    let items = selector(r#"article[class*="ms-item" i], div[class*="ms-item" i]"#)?;
    let headline = selector(
        r#"h2[class*="headline" i], h2[class*="title" i], h3[class*="headline" i], h3[class*="title" i], a[class*="headline" i], a[class*="title" i]"#,
    )?;
    let any_link = selector("a")?;
    let summary = selector(
        r#"p[class*="summary" i], p[class*="excerpt" i], div[class*="summary" i], div[class*="excerpt" i]"#,
    )?;

    let mut articles = Vec::new();
    for item in document.select(&items).take(MAX_NEWS_ITEMS) {
        let Some(title_el) = item
            .select(&headline)
            .next()
            .or_else(|| item.select(&any_link).next())
        else {
            continue;
        };

        let title = element_text(title_el);
        if title.is_empty() {
            continue;
        }
        let url = if is_link(title_el) { link_of(title_el, page_url) } else { page_url.to_string() };
        let content = item.select(&summary).next().map(element_text).filter(|t| !t.is_empty());

        articles.push(news_document(&title, content, &url, "Motorsport.com"));
    }

    Ok(articles)
}

fn parse_autosport_news(html: &str, page_url: &str) -> Result<Vec<RawDocument>> {
    let document = Html::parse_document(html);
    let items = selector(r#"article[class*="article" i], div[class*="article" i]"#)?;
    let headline = selector("h2, h3, a")?;
    let summary = selector(r#"p[class*="summary" i], div[class*="summary" i]"#)?;

    let mut articles = Vec::new();
    for item in document.select(&items).take(MAX_NEWS_ITEMS) {
        let Some(title_el) = item.select(&headline).next() else { continue };

        let title = element_text(title_el);
        if title.is_empty() {
            continue;
        }
        let url = if is_link(title_el) { link_of(title_el, page_url) } else { page_url.to_string() };
        let content = item.select(&summary).next().map(element_text).filter(|t| !t.is_empty());

        articles.push(news_document(&title, content, &url, "Autosport.com"));
    }

    Ok(articles)
}

fn parse_f1nsight(html: &str, page_url: &str) -> Result<Vec<RawDocument>> {
    let document = Html::parse_document(html);
    let elements = selector("article, div, h2, h3")?;
    let inner_title = selector("h2, h3, a")?;

    let mut articles = Vec::new();
    for element in document.select(&elements).take(10) {
        let title = match element.value().name() {
            "h2" | "h3" => {
                let text = element_text(element);
                if text.chars().count() <= 20 {
                    continue;
                }
                text
            }
            _ => match element.select(&inner_title).next() {
                Some(title_el) => element_text(title_el),
                None => continue,
            },
        };

        if title.is_empty() {
            continue;
        }
        articles.push(RawDocument::new(&title, &title, page_url, "F1nsight.com", "analysis").scraped_now());
    }

    Ok(articles)
}

/// First table with more than five rows, top ten lines.
fn parse_standings(html: &str, page_url: &str, season: i32) -> Result<Vec<RawDocument>> {
    let document = Html::parse_document(html);
    let tables = selector("table")?;
    let rows = selector("tr")?;
    let cells = selector("td, th")?;

    for table in document.select(&tables) {
        let table_rows: Vec<_> = table.select(&rows).collect();
        if table_rows.len() <= 5 {
            continue;
        }

        let mut content = format!("{} F1 Championship Standings:\n", season);
        for row in table_rows.iter().skip(1).take(10) {
            let row_cells: Vec<String> = row.select(&cells).map(element_text).collect();
            if row_cells.len() >= 3 {
                content.push_str(&format!(
                    "{}. {} - {} points\n",
                    row_cells[0],
                    row_cells[1],
                    row_cells[row_cells.len() - 1]
                ));
            }
        }

        return Ok(vec![RawDocument::new(
            &format!("F1 {} Championship Standings", season),
            &content,
            page_url,
            "Motorsport.com",
            "standings",
        )
        .scraped_now()]);
    }

    Ok(Vec::new())
}

fn is_race_line(text: &str) -> bool {
    text.contains("Grand Prix") || text.contains("GP")
}

fn parse_schedule(html: &str, page_url: &str, season: i32) -> Result<Vec<RawDocument>> {
    let document = Html::parse_document(html);
    let races = selector(r#"div[class*="race" i], tr[class*="race" i]"#)?;

    let lines: Vec<String> = document
        .select(&races)
        .take(MAX_SCHEDULE_ITEMS)
        .map(element_text)
        .filter(|text| text.chars().count() > 20 && is_race_line(text))
        .collect();

    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let mut content = format!("{} Formula 1 Race Calendar:\n", season);
    for line in &lines {
        content.push_str(&format!("• {}\n", line));
    }

    Ok(vec![RawDocument::new(
        &format!("F1 {} Race Calendar", season),
        &content,
        page_url,
        "Motorsport.com",
        "schedule",
    )
    .scraped_now()])
}

/// Container selectors tried in order for season news listings.
const SEASON_NEWS_SELECTORS: &[&str] = &[
    "article",
    r#"[class*="news"]"#,
    r#"[class*="article"]"#,
    r#"[class*="item"]"#,
    r#"div[class*="ms-"]"#,
];

fn parse_season_news(html: &str, page_url: &str, year: i32) -> Result<Vec<RawDocument>> {
    let document = Html::parse_document(html);
    let heading = selector("h1, h2, h3, h4")?;
    let news_link = selector(r#"a[href*="/news/"]"#)?;
    let any_link = selector("a")?;
    let summary = selector(r#"p, [class*="summary"], [class*="excerpt"]"#)?;
    let source = format!("Motorsport.com {}", year);

    for css in SEASON_NEWS_SELECTORS {
        let containers = selector(css)?;
        let mut articles = Vec::new();

        for element in document.select(&containers).take(MAX_NEWS_ITEMS) {
            let Some(title_el) = element
                .select(&heading)
                .next()
                .or_else(|| element.select(&news_link).next())
                .or_else(|| element.select(&any_link).next())
            else {
                continue;
            };

            let title = element_text(title_el);
            if title.chars().count() <= 15 {
                continue;
            }

            let url = if is_link(title_el) {
                link_of(title_el, page_url)
            } else {
                element
                    .select(&any_link)
                    .next()
                    .map(|a| link_of(a, page_url))
                    .unwrap_or_else(|| page_url.to_string())
            };
            let content = element.select(&summary).next().map(element_text).filter(|t| !t.is_empty());

            articles.push(news_document(&title, content, &url, &source).with_year(year));
        }

        if !articles.is_empty() {
            return Ok(articles);
        }
    }

    Ok(Vec::new())
}

fn parse_season_standings(html: &str, page_url: &str, year: i32) -> Result<Vec<RawDocument>> {
    let document = Html::parse_document(html);
    let tables = selector(
        r#"table[class*="standing" i], table[class*="result" i], div[class*="standing" i], div[class*="result" i]"#,
    )?;
    let rows = selector("tr, div")?;

    for table in document.select(&tables) {
        let table_rows: Vec<_> = table.select(&rows).collect();
        if table_rows.len() <= 5 {
            continue;
        }

        let mut content = format!("{} F1 Championship Standings:\n", year);
        for row in table_rows.iter().skip(1).take(10) {
            let text = element_text(*row);
            if text.chars().count() > 10 {
                content.push_str(&text);
                content.push('\n');
            }
        }

        if content.chars().count() > 100 {
            return Ok(vec![RawDocument::new(
                &format!("F1 {} Championship Standings", year),
                &content,
                page_url,
                &format!("Standings {}", year),
                "standings",
            )
            .with_year(year)
            .scraped_now()]);
        }
    }

    Ok(Vec::new())
}

fn parse_season_schedule(html: &str, page_url: &str, year: i32) -> Result<Vec<RawDocument>> {
    let document = Html::parse_document(html);
    let races = selector(
        r#"div[class*="race" i], tr[class*="race" i], li[class*="race" i], div[class*="grand" i], tr[class*="grand" i], li[class*="grand" i]"#,
    )?;

    let lines: Vec<String> = document
        .select(&races)
        .map(element_text)
        .filter(|text| text.contains("Grand Prix") || (text.contains("GP") && text.chars().count() > 20))
        .take(MAX_SEASON_RACES)
        .collect();

    // A handful of matches is usually page chrome, not a calendar.
    if lines.len() <= 3 {
        return Ok(Vec::new());
    }

    let mut content = format!("{} Formula 1 Race Calendar:\n", year);
    for line in &lines {
        content.push_str(&format!("• {}\n", line));
    }

    Ok(vec![RawDocument::new(
        &format!("F1 {} Race Calendar", year),
        &content,
        page_url,
        &format!("Schedule {}", year),
        "schedule",
    )
    .with_year(year)
    .scraped_now()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scraper_for(server: &MockServer) -> NewsScraper {
        let settings = ScrapingSettings {
            motorsport_base_url: server.uri(),
            autosport_base_url: server.uri(),
            f1nsight_url: format!("{}/f1nsight", server.uri()),
            season: 2025,
            request_delay_ms: 0,
            ..Default::default()
        };
        NewsScraper::new(HttpFetcher::new(&settings).unwrap(), &settings)
    }

    #[tokio::test]
    async fn test_motorsport_news() {
        let server = MockServer::start().await;
        let html = r#"
            <div class="ms-item ms-item--news">
              <a class="ms-item__title" href="/f1/news/piastri-extends/123/">Piastri extends McLaren deal</a>
              <p class="ms-item__summary">The Australian stays until 2028.</p>
            </div>
            <div class="ms-item"><span>no title here</span></div>"#;
        Mock::given(method("GET"))
            .and(path("/f1/news/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let docs = scraper_for(&server).motorsport_news().await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Piastri extends McLaren deal");
        assert_eq!(docs[0].content, "Piastri extends McLaren deal. The Australian stays until 2028.");
        assert_eq!(docs[0].url, format!("{}/f1/news/piastri-extends/123/", server.uri()));
        assert_eq!(docs[0].source, "Motorsport.com");
    }

    #[tokio::test]
    async fn test_failed_page_yields_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let scraper = scraper_for(&server);
        assert!(scraper.autosport_news().await.is_empty());
        assert!(scraper.standings().await.is_empty());
    }

    #[test]
    fn test_autosport_uses_title_when_no_summary() {
        let html = r#"<article class="article-card"><h3>Alonso eyes podium</h3></article>"#;
        let docs = parse_autosport_news(html, "https://www.autosport.com/f1/news/").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "Alonso eyes podium. Alonso eyes podium");
        assert_eq!(docs[0].url, "https://www.autosport.com/f1/news/");
    }

    #[test]
    fn test_f1nsight_filters_short_headings() {
        let html = "<h2>Short one</h2><h3>Why Ferrari's upgrade package changed everything</h3>";
        let docs = parse_f1nsight(html, "https://www.f1nsight.com/").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].doc_type, "analysis");
    }

    #[test]
    fn test_standings_table() {
        let mut rows = String::from("<tr><th>Pos</th><th>Driver</th><th>Points</th></tr>");
        for (i, name) in ["Norris", "Piastri", "Verstappen", "Russell", "Leclerc", "Hamilton"].iter().enumerate() {
            rows.push_str(&format!("<tr><td>{}</td><td>{}</td><td>{}</td></tr>", i + 1, name, 300 - i * 20));
        }
        let html = format!("<table><tr><td>small</td></tr></table><table>{}</table>", rows);

        let docs = parse_standings(&html, "https://m/f1/standings/2025/", 2025).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.starts_with("2025 F1 Championship Standings:\n1. Norris - 300 points\n"));
        assert!(docs[0].content.contains("6. Hamilton - 200 points"));
    }

    #[test]
    fn test_schedule_requires_race_lines() {
        let html = r#"
            <div class="race-row">Round 1 Australian Grand Prix 16 March</div>
            <div class="race-row">Pre-season testing in Bahrain</div>"#;
        let docs = parse_schedule(html, "https://m/f1/schedule/2025/", 2025).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(
            docs[0].content,
            "2025 Formula 1 Race Calendar:\n• Round 1 Australian Grand Prix 16 March\n"
        );

        assert!(parse_schedule("<div class='race'>Testing</div>", "u", 2025).unwrap().is_empty());
    }

    #[test]
    fn test_class_matching_ignores_case() {
        let html = r#"<tr class="RaceRow"><td>Round 5 Miami Grand Prix 4 May 2025</td></tr>"#;
        let docs = parse_schedule(&format!("<table>{}</table>", html), "u", 2025).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.contains("Miami Grand Prix"));

        let table: String = (1..=6)
            .map(|p| format!("<tr><td>{}</td><td>Driver {}</td><td>{} pts</td></tr>", p, p, 100 - p))
            .collect();
        let html = format!(r#"<div class="Season-Standings"><table class="StandingsTable">{}</table></div>"#, table);
        let docs = parse_season_standings(&html, "u", 2024).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_season_news_selector_cascade() {
        let html = r#"
            <div class="news-list">
              <h3>Hamilton takes emotional final win with Mercedes</h3>
              <a href="/f1/news/hamilton-final-win/">Read</a>
              <p>Seven-time champion bows out in style.</p>
            </div>"#;
        let docs = parse_season_news(html, "https://www.motorsport.com/f1/news/2024", 2024).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "Motorsport.com 2024");
        assert_eq!(docs[0].year.as_deref(), Some("2024"));
        assert_eq!(docs[0].url, "https://www.motorsport.com/f1/news/hamilton-final-win/");
        assert!(docs[0].content.ends_with("Seven-time champion bows out in style."));
    }

    #[test]
    fn test_season_schedule_needs_more_than_three_races() {
        let races: String = ["Bahrain", "Saudi Arabian", "Australian", "Japanese"]
            .iter()
            .map(|r| format!("<li class='race-item'>{} Grand Prix</li>", r))
            .collect();
        let docs = parse_season_schedule(&races, "u", 2023).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "Schedule 2023");

        let few: String = races.split("</li>").take(3).map(|s| format!("{}</li>", s)).collect();
        assert!(parse_season_schedule(&few, "u", 2023).unwrap().is_empty());
    }
}
