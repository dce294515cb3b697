use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use triad_agent::truncate_output;
use triad_core::WorkflowOutcome;
use triad_critic::ScoreSource;

/// Responses longer than this are cut in summaries
pub const PREVIEW_CHARS: usize = 500;

/// Write `value` as pretty JSON to `dir/file_name`, creating `dir` if needed
pub fn save_json<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_banner(title: &str) {
    let rule = "=".repeat(60);
    eprintln!();
    eprintln!("{}", rule.bright_cyan());
    eprintln!("{}", title.bright_cyan().bold());
    eprintln!("{}", rule.bright_cyan());
    eprintln!();
}

/// `text` cut to `max` bytes on a line boundary, with an ellipsis when cut
pub fn preview(text: &str, max: usize) -> String {
    let cut = truncate_output(text, max);
    if cut.len() < text.len() {
        format!("{}...", cut.trim_end())
    } else {
        text.to_string()
    }
}

pub fn print_outcome(outcome: &WorkflowOutcome, max_chars: Option<usize>) {
    let response = match max_chars {
        Some(max) => preview(outcome.final_response(), max),
        None => outcome.final_response().to_string(),
    };

    println!();
    println!("{}", "Response:".bright_green().bold());
    println!("{}", response);
    println!();

    let defaulted = match outcome.score_source {
        ScoreSource::Default => " (default)",
        ScoreSource::Parsed => "",
    };
    println!(
        "{} {}{} | {} {:.2}s | {} {}",
        "Score:".bright_cyan(),
        outcome.score,
        defaulted,
        "Time:".bright_cyan(),
        outcome.total_duration_secs,
        "Iterations:".bright_cyan(),
        outcome.iterations
    );
}
