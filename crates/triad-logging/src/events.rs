use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use triad_agent::Role;

/// Structured log events for the pipeline and the evaluation driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    WorkflowStarted {
        session_id: String,
        query: String,
    },
    StageStarted {
        iteration: usize,
        stage: Role,
    },
    StageCompleted {
        iteration: usize,
        stage: Role,
        duration_secs: f64,
        response_chars: usize,
    },
    CritiqueScored {
        iteration: usize,
        score: u8,
        threshold: u8,
        /// No score was found in the reply and the default was used
        defaulted: bool,
    },
    RefinementStarted {
        score: u8,
        threshold: u8,
    },
    WorkflowCompleted {
        iterations: usize,
        score: u8,
        duration_secs: f64,
    },
    BaselineStarted,
    BaselineCompleted {
        duration_secs: f64,
        response_chars: usize,
    },
    TaskStarted {
        index: usize,
        total: usize,
        task_id: String,
        kind: String,
        query: String,
    },
    TaskCompleted {
        task_id: String,
        score: u8,
        iterations: usize,
        duration_secs: f64,
    },
    EvaluationCompleted {
        tasks: usize,
        average_score: f64,
        passed: usize,
        failed: usize,
    },
    ErrorEncountered {
        stage: Option<Role>,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Progress logger - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    quiet: bool,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            quiet: false,
            file_writer: None,
        }
    }

    /// A logger that writes nothing to the console
    pub fn silent() -> Self {
        Self {
            quiet: true,
            ..Self::new(LogFormat::Compact)
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            quiet: false,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if self.quiet {
            return;
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::WorkflowStarted { query, .. } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}{}",
                    "│".bright_blue(),
                    "triad".bold().bright_white(),
                    " ".repeat(62) + &"│".bright_blue().to_string()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Query:".dimmed(),
                    Self::truncate_with_padding(query, 60, 61).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::StageStarted { iteration, stage } => {
                let step = match stage {
                    Role::Retriever => "[1/3]",
                    Role::Synthesizer => "[2/3]",
                    Role::Critic => "[3/3]",
                    Role::User => "[-/-]",
                };
                let label = stage.as_str().to_uppercase();
                let styled = match stage {
                    Role::Critic => label.bright_magenta().bold(),
                    _ => label.bright_cyan().bold(),
                };
                let pass = if *iteration > 0 {
                    format!(" (pass {})", iteration + 1).dimmed().to_string()
                } else {
                    String::new()
                };
                let _ = writeln!(
                    stderr,
                    "  {} {} {}{}",
                    "▶".bright_cyan(),
                    step.dimmed(),
                    styled,
                    pass
                );
            }
            LogEvent::StageCompleted {
                duration_secs,
                response_chars,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} Done ({:.1}s, {} chars)",
                    "✓".bright_green(),
                    duration_secs,
                    response_chars
                );
            }
            LogEvent::CritiqueScored {
                score,
                threshold,
                defaulted,
                ..
            } => {
                let text = if *defaulted {
                    format!("Score: {}/10 (no score in reply, default used)", score)
                } else {
                    format!("Score: {}/10", score)
                };
                let styled = if score >= threshold {
                    format!("✓ {}", text).bright_green().to_string()
                } else {
                    format!("→ {}", text).bright_yellow().to_string()
                };
                let _ = writeln!(stderr, "    {}", styled);
                let _ = writeln!(stderr);
            }
            LogEvent::RefinementStarted { score, threshold } => {
                let _ = writeln!(
                    stderr,
                    "{} Score {}/10 is below {} - refining response",
                    "↻".bright_yellow(),
                    score,
                    threshold
                );
                let _ = writeln!(stderr);
            }
            LogEvent::WorkflowCompleted {
                iterations,
                score,
                duration_secs,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} Workflow complete: {}/10 after {} {} ({:.1}s)",
                    "✓".bright_green(),
                    score,
                    iterations,
                    if *iterations == 1 { "pass" } else { "passes" },
                    duration_secs
                );
            }
            LogEvent::BaselineStarted => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_blue(),
                    "SINGLE-AGENT BASELINE".bright_blue().bold()
                );
            }
            LogEvent::BaselineCompleted {
                duration_secs,
                response_chars,
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} Done ({:.1}s, {} chars)",
                    "✓".bright_green(),
                    duration_secs,
                    response_chars
                );
                let _ = writeln!(stderr);
            }
            LogEvent::TaskStarted {
                index,
                total,
                kind,
                query,
                ..
            } => {
                let header = Self::task_header(*index, *total, kind);
                let padding = "─".repeat(67usize.saturating_sub(header.chars().count()));
                let _ = writeln!(
                    stderr,
                    "{}{}{}",
                    "┌".bright_blue(),
                    header.bright_blue().bold(),
                    padding.bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "Query:".dimmed(),
                    Self::truncate(query, 100).dimmed()
                );
            }
            LogEvent::TaskCompleted { .. } => {
                let _ = writeln!(
                    stderr,
                    "{}",
                    "└─────────────────────────────────────────────────────────────────────┘"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::EvaluationCompleted { .. } => {
                // The summary table is printed by the caller
            }
            LogEvent::ErrorEncountered { stage, .. } => {
                // The caller reports the error message itself
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} {}",
                    "✗".bright_red(),
                    Self::failure_line(*stage).bright_red()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let timestamp = chrono::Utc::now().format("%H:%M:%S").to_string();
        let _ = writeln!(std::io::stderr(), "{}", Self::compact_line(event, &timestamp));
    }

    fn compact_line(event: &LogEvent, timestamp: &str) -> String {
        match event {
            LogEvent::WorkflowStarted { session_id, .. } => {
                format!("[{}] workflow:start:{}", timestamp, session_id)
            }
            LogEvent::StageStarted { iteration, stage } => {
                format!("[{}] {}:start:{}", timestamp, stage, iteration + 1)
            }
            LogEvent::StageCompleted {
                iteration,
                stage,
                duration_secs,
                response_chars,
            } => format!(
                "[{}] {}:done:{} {:.1}s {}c",
                timestamp,
                stage,
                iteration + 1,
                duration_secs,
                response_chars
            ),
            LogEvent::CritiqueScored {
                iteration, score, ..
            } => format!("[{}] score:{} {}/10", timestamp, iteration + 1, score),
            LogEvent::RefinementStarted { score, threshold } => {
                format!("[{}] refine {}<{}", timestamp, score, threshold)
            }
            LogEvent::WorkflowCompleted {
                iterations,
                score,
                duration_secs,
            } => format!(
                "[{}] workflow:done:{} {}/10 {:.1}s",
                timestamp, iterations, score, duration_secs
            ),
            LogEvent::BaselineStarted => format!("[{}] baseline:start", timestamp),
            LogEvent::BaselineCompleted { duration_secs, .. } => {
                format!("[{}] baseline:done {:.1}s", timestamp, duration_secs)
            }
            LogEvent::TaskStarted {
                index,
                total,
                task_id,
                ..
            } => format!(
                "[{}] task:start:{} {}/{}",
                timestamp,
                task_id,
                index,
                total
            ),
            LogEvent::TaskCompleted {
                task_id,
                score,
                duration_secs,
                ..
            } => format!(
                "[{}] task:done:{} {}/10 {:.1}s",
                timestamp, task_id, score, duration_secs
            ),
            LogEvent::EvaluationCompleted {
                tasks,
                average_score,
                passed,
                failed,
            } => format!(
                "[{}] eval:done {} tasks avg={:.2} pass={} fail={}",
                timestamp, tasks, average_score, passed, failed
            ),
            LogEvent::ErrorEncountered { stage, error } => match stage {
                Some(stage) => format!("[{}] error:{}:{}", timestamp, stage, error),
                None => format!("[{}] error:{}", timestamp, error),
            },
        }
    }

    /// `index` is already 1-based
    fn task_header(index: usize, total: usize, kind: &str) -> String {
        format!("─ Task {}/{}: {} ", index, total, kind.to_uppercase())
    }

    fn failure_line(stage: Option<Role>) -> String {
        match stage {
            Some(stage) => format!("Failed in the {} stage", stage),
            None => "Failed".to_string(),
        }
    }

    fn truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() > max_chars {
            let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", cut)
        } else {
            s.to_string()
        }
    }

    /// Truncate a string and pad to exact width
    fn truncate_with_padding(s: &str, max_chars: usize, total_width: usize) -> String {
        let truncated = Self::truncate(s, max_chars);
        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1); // +1 for trailing │
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}
