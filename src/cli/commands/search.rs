//! Search command implementation.

use super::preflight_or_hint;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::ContextBuilder;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, min_score: f32, settings: Settings) -> Result<()> {
    preflight_or_hint(Operation::Search, &settings)?;

    let orchestrator = Orchestrator::new(settings).await?;
    let context_builder = ContextBuilder::new(orchestrator.vector_store(), orchestrator.embedder())
        .with_top_k(limit)
        .with_min_score(min_score);

    let spinner = Output::spinner("Searching...");
    let results = context_builder.retrieve(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) if results.is_empty() => {
            Output::warning("No results found matching your query.");
        }
        Ok(results) => {
            Output::success(&format!("Found {} results", results.len()));
            for result in &results {
                Output::search_result(
                    &result.metadata.title,
                    &result.metadata.source,
                    result.score,
                    &result.content,
                    &result.metadata.url,
                );
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
