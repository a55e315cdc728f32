//! Seed command: upload sample facts and verify retrieval.

use super::preflight_or_hint;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

pub async fn run_seed(settings: Settings) -> Result<()> {
    preflight_or_hint(Operation::Ingest, &settings)?;
    let orchestrator = Orchestrator::new(settings).await?;

    let results = orchestrator.seed_samples().await?;
    Output::success("Uploaded sample F1 data");

    Output::header("Test search: Max Verstappen");
    for result in &results {
        Output::search_result(
            &result.metadata.title,
            &result.metadata.source,
            result.score,
            &result.content,
            &result.metadata.url,
        );
    }
    Ok(())
}
