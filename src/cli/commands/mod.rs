//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod search;
mod seed;
mod serve;
mod stats;
mod update;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use search::run_search;
pub use seed::run_seed;
pub use serve::{pick_examples, router, run_serve, AppState, ExampleQuestions};
pub use stats::run_stats;
pub use update::{run_news, run_seasons, run_update};

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::language::GoogleTranslator;
use crate::llm::GroqChatModel;
use crate::orchestrator::Orchestrator;
use crate::rag::RagEngine;
use std::sync::Arc;

/// Run pre-flight checks, pointing at `doctor` when they fail.
fn preflight_or_hint(operation: Operation, settings: &Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(operation, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'paddock doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    Ok(())
}

/// Connect to the index and build the answering engine.
async fn build_engine(settings: Settings) -> anyhow::Result<RagEngine> {
    preflight_or_hint(Operation::Ask, &settings)?;

    let llm = Arc::new(GroqChatModel::new(&settings.llm)?);
    let translator = Arc::new(GoogleTranslator::new(&settings.language.translate_url)?);
    let orchestrator = Orchestrator::new(settings).await?;
    Ok(orchestrator.rag_engine(llm, translator))
}
