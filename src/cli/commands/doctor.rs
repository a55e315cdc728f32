//! Doctor command - verify configuration and external requirements.

use crate::chunking::TiktokenCounter;
use crate::cli::Output;
use crate::config::{Settings, VectorStoreProvider};
use console::style;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// Outcome of one doctor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    fn new(status: CheckStatus, name: &str, message: &str, hint: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    fn ok(name: &str, message: &str) -> Self {
        Self::new(CheckStatus::Ok, name, message, None)
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self::new(CheckStatus::Warning, name, message, Some(hint))
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self::new(CheckStatus::Error, name, message, Some(hint))
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };
        write!(f, "  {} {:<18} {}", icon, style(&self.name).bold(), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n      {}", style(hint).dim().italic())?;
        }
        Ok(())
    }
}

/// Counts of (errors, warnings).
fn tally<'a>(checks: impl IntoIterator<Item = &'a CheckResult>) -> (usize, usize) {
    checks.into_iter().fold((0, 0), |(errors, warnings), check| match check.status {
        CheckStatus::Error => (errors + 1, warnings),
        CheckStatus::Warning => (errors, warnings + 1),
        CheckStatus::Ok => (errors, warnings),
    })
}

fn print_group(title: &str, group: &[CheckResult]) {
    Output::header(title);
    for check in group {
        println!("{}", check);
    }
}

/// Check API keys, the headless browser and the configuration.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Paddock Doctor");

    let openai_key = std::env::var("OPENAI_API_KEY").ok();
    let pinecone_required = settings.vector_store.provider == VectorStoreProvider::Pinecone;

    let api = vec![
        check_key("OPENAI_API_KEY", openai_key.as_deref(), true, "Set with: export OPENAI_API_KEY='sk-...'"),
        check_key("GROQ_API_KEY", settings.llm.api_key.as_deref(), true, "Set with: export GROQ_API_KEY='gsk_...'"),
        check_key(
            "PINECONE_API_KEY",
            settings.vector_store.api_key.as_deref(),
            pinecone_required,
            "Set with: export PINECONE_API_KEY='pcsk_...'",
        ),
    ];
    print_group("API keys", &api);

    let tools = vec![check_browser()];
    print_group("Headless browser", &tools);

    let config = vec![
        check_config_file(config_path),
        check_tokenizer(settings),
        check_settings(settings),
    ];
    print_group("Configuration", &config);
    println!();

    match tally(api.iter().chain(&tools).chain(&config)) {
        (0, 0) => Output::success("All checks passed, Paddock is ready."),
        (0, warnings) => Output::warning(&format!("Ready, with {} warning(s).", warnings)),
        (errors, _) => anyhow::bail!("{} check(s) failed", errors),
    }

    Ok(())
}

/// Show only the ends of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_key(name: &str, value: Option<&str>, required: bool, hint: &str) -> CheckResult {
    match value.map(str::trim) {
        Some(key) if !key.is_empty() => CheckResult::ok(name, &format!("configured ({})", mask_key(key))),
        _ if required => CheckResult::error(name, "not set", hint),
        _ => CheckResult::ok(name, "not needed for the memory store"),
    }
}

/// Chrome is only needed for formula1.com and rendered season pages.
fn check_browser() -> CheckResult {
    if let Ok(path) = std::env::var("CHROME") {
        if Path::new(&path).exists() {
            return CheckResult::ok("Chrome", &path);
        }
    }

    for candidate in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(output) = Command::new(candidate).arg("--version").output() {
            if output.status.success() {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                return CheckResult::ok("Chrome", &version);
            }
        }
    }

    CheckResult::warning(
        "Chrome",
        "not found",
        "formula1.com pages fall back to sample news; install Chrome or Chromium to scrape them",
    )
}

fn check_config_file(path: &Path) -> CheckResult {
    if path.exists() {
        CheckResult::ok("Config file", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override defaults", path.display()),
        )
    }
}

fn check_tokenizer(settings: &Settings) -> CheckResult {
    match TiktokenCounter::new(&settings.chunking.encoding) {
        Ok(_) => CheckResult::ok("Tokenizer", &settings.chunking.encoding),
        Err(e) => CheckResult::error("Tokenizer", &e.to_string(), "Use cl100k_base or o200k_base"),
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok(
            "Settings",
            &format!(
                "index {} ({}d), chunks {}/{} tokens",
                settings.vector_store.index_name,
                settings.embedding.dimensions,
                settings.chunking.chunk_size,
                settings.chunking.chunk_overlap
            ),
        ),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix the value in the config file"),
    }
}
