//! Knowledge base ingestion commands.

use super::preflight_or_hint;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, UpdateReport};
use anyhow::Result;

fn print_report(report: &UpdateReport) {
    Output::kv("Documents", &report.scraped_documents.to_string());
    Output::kv("Chunks", &report.created_chunks.to_string());
    for source in &report.sources {
        Output::list_item(source);
    }
}

/// Rebuild the knowledge base from Wikipedia, formula1.com and OpenF1.
pub async fn run_update(settings: Settings) -> Result<()> {
    preflight_or_hint(Operation::Ingest, &settings)?;
    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner("Scraping Wikipedia, formula1.com and OpenF1...");
    let result = orchestrator.scrape_and_update().await;
    spinner.finish_and_clear();

    let report = result?;
    Output::success("Successfully updated F1 knowledge base");
    print_report(&report);
    Ok(())
}

/// Index the latest news articles.
pub async fn run_news(settings: Settings) -> Result<()> {
    preflight_or_hint(Operation::Ingest, &settings)?;
    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner("Scraping news sites and RSS feeds...");
    let result = orchestrator.refresh_news().await;
    spinner.finish_and_clear();

    let report = result?;
    Output::success("Fresh F1 news added");
    print_report(&report);
    Ok(())
}

/// Index a range of seasons.
pub async fn run_seasons(
    start: i32,
    end: i32,
    workers: Option<usize>,
    rendered: bool,
    settings: Settings,
) -> Result<()> {
    preflight_or_hint(Operation::Ingest, &settings)?;
    let workers = workers.unwrap_or(settings.scraping.max_workers);
    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner(&format!("Scraping seasons {}-{} with {} workers...", start, end, workers));
    let result = orchestrator.multi_season(start, end, workers, rendered).await;
    spinner.finish_and_clear();

    let report = result?;
    Output::success(&format!("Indexed seasons {}-{}", start, end));
    print_report(&report);
    Ok(())
}
