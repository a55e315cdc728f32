//! Terminal output helpers shared by the CLI commands.

use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Width of search hit previews, in characters.
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

impl Tone {
    fn marker(self) -> StyledObject<&'static str> {
        match self {
            Tone::Info => style("·").cyan().bold(),
            Tone::Success => style("✓").green().bold(),
            Tone::Warning => style("!").yellow().bold(),
            Tone::Error => style("✗").red().bold(),
        }
    }

    /// Warnings and errors go to stderr.
    fn to_stderr(self) -> bool {
        matches!(self, Tone::Warning | Tone::Error)
    }
}

fn emit(tone: Tone, msg: &str) {
    if tone.to_stderr() {
        eprintln!("{} {}", tone.marker(), msg);
    } else {
        println!("{} {}", tone.marker(), msg);
    }
}

/// Console formatting for commands.
pub struct Output;

impl Output {
    pub fn info(msg: &str) {
        emit(Tone::Info, msg);
    }

    pub fn success(msg: &str) {
        emit(Tone::Success, msg);
    }

    pub fn warning(msg: &str) {
        emit(Tone::Warning, msg);
    }

    pub fn error(msg: &str) {
        emit(Tone::Error, msg);
    }

    /// Section title with a blank line above it.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    pub fn kv(key: &str, value: &str) {
        println!("  {:<14} {}", style(format!("{}:", key)).dim(), value);
    }

    pub fn list_item(msg: &str) {
        println!("  {} {}", style("-").cyan(), msg);
    }

    /// One retrieved chunk: title line, preview, then the url if there is one.
    pub fn search_result(title: &str, source: &str, score: f32, content: &str, url: &str) {
        println!(
            "\n{} {} [{}] {}",
            style(format!("{:.2}", score)).green(),
            style(title).bold(),
            style(source).cyan(),
            style(score_label(score)).dim()
        );
        println!("   {}", content_preview(content, PREVIEW_CHARS));
        if !url.is_empty() {
            println!("   {}", style(url).dim().underlined());
        }
    }

    /// Spinner for a pending network call. Call `finish_and_clear` when done.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner()
            .tick_strings(&["◐", "◓", "◑", "◒", "●"])
            .template("{spinner:.red} {msg} {elapsed:.dim}")
        {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

fn score_label(score: f32) -> &'static str {
    match score {
        s if s >= 0.75 => "strong match",
        s if s >= 0.5 => "good match",
        _ => "weak match",
    }
}

/// Single-line preview, cut on a character boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}
