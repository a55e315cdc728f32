//! Ask command implementation.

use super::build_engine;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, settings: Settings) -> Result<()> {
    let engine = build_engine(settings).await?;

    let spinner = Output::spinner("Searching knowledge base...");
    let response = engine.query(question).await;
    spinner.finish_and_clear();

    if let Some(error) = &response.error {
        Output::error(&response.answer);
        return Err(anyhow::anyhow!("{}", error));
    }

    Output::kv("Language", response.language.code());
    if response.english_question != response.original_question {
        Output::kv("Translated", &response.english_question);
    }
    println!("\n{}", response.format_for_display());
    Output::info(&format!("Answered from {} retrieved chunks", response.retrieved_docs));

    Ok(())
}
