//! CLI module for Paddock.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Paddock - bilingual Formula 1 trivia assistant
///
/// Scrapes Formula 1 sources into a vector index and answers questions in
/// English or Hindi with retrieval-augmented generation.
#[derive(Parser, Debug)]
#[command(name = "paddock")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat web server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Rebuild the knowledge base from Wikipedia, formula1.com and OpenF1
    Update,

    /// Add the latest news from F1 news sites and RSS feeds
    News,

    /// Scrape and index several past seasons
    Seasons {
        /// First season
        #[arg(long, default_value = "2020")]
        start: i32,

        /// Last season
        #[arg(long, default_value = "2025")]
        end: i32,

        /// Seasons scraped in parallel (defaults to scraping.max_workers)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Also render the JavaScript listings with a headless browser
        #[arg(long)]
        rendered: bool,
    },

    /// Upload sample facts and run a test search
    Seed,

    /// Ask a question and get an answer with sources
    Ask {
        /// The question, in English or Hindi
        question: String,
    },

    /// Search the knowledge base without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long, default_value = "0.3")]
        min_score: f32,
    },

    /// Start an interactive chat session
    Chat,

    /// Show vector index statistics
    Stats,

    /// Check configuration and external requirements
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seasons() {
        let cli = Cli::parse_from(["paddock", "-vv", "seasons", "--start", "2021", "--end", "2023", "--rendered"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Seasons { start, end, workers, rendered } => {
                assert_eq!((start, end), (2021, 2023));
                assert_eq!(workers, None);
                assert!(rendered);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask_with_config() {
        let cli = Cli::parse_from(["paddock", "ask", "What is DRS?", "--config", "/tmp/p.toml"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/p.toml"));
        assert!(matches!(cli.command, Commands::Ask { ref question } if question == "What is DRS?"));
    }
}
