//! Interactive chat command.

use super::build_engine;
use crate::cli::Output;
use crate::config::Settings;
use crate::language::Language;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    let engine = build_engine(settings).await?;

    println!("\n{}", style("Paddock F1 Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask in English or Hindi, or type 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let response = engine.query(input).await;
        spinner.finish_and_clear();

        let label = match response.language {
            Language::English => "Paddock:",
            Language::Hindi => "Paddock (hi):",
        };
        println!("\n{} {}\n", style(label).cyan().bold(), response.format_for_display());
        if let Some(error) = &response.error {
            Output::warning(error);
        }
    }

    Ok(())
}
