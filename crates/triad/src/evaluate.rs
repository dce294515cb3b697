use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use triad_core::{
    default_tasks, load_tasks, EvaluationReport, Evaluator, QUALITY_THRESHOLD,
};

use crate::demo::format_pct;
use crate::output::{preview, print_banner, print_json, save_json, PREVIEW_CHARS};
use crate::App;

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// JSON or YAML task file (default: built-in task set)
    #[arg(long)]
    pub tasks: Option<PathBuf>,

    /// Skip the single-call baseline
    #[arg(long)]
    pub no_baseline: bool,

    /// Do not write the report to the output directory
    #[arg(long)]
    pub no_save: bool,

    /// Pause between tasks, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Minimum score counted as a pass
    #[arg(long, default_value_t = QUALITY_THRESHOLD, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub pass_threshold: u8,
}

pub async fn handle_evaluate_command(app: &App, args: EvaluateArgs) -> Result<()> {
    let tasks = match args.tasks {
        Some(ref path) => load_tasks(path)
            .with_context(|| format!("Failed to load tasks from {}", path.display()))?,
        None => default_tasks(),
    };

    if !app.json_output {
        print_banner("Starting Evaluation: Multi-Agent vs Single-Agent");
        eprintln!("{} task(s), pass threshold {}/10\n", tasks.len(), args.pass_threshold);
    }

    let runner = app.runner();
    let baseline = app.baseline();
    let mut evaluator = Evaluator::new(&runner)
        .with_delay(Duration::from_millis(args.delay_ms))
        .with_pass_threshold(args.pass_threshold);
    if !args.no_baseline {
        evaluator = evaluator.with_baseline(&baseline);
    }

    let report = evaluator.run(&tasks).await?;

    let saved = if args.no_save {
        None
    } else {
        let file_name = format!("evaluation_{}.json", report.generated_at.timestamp());
        Some(save_json(&app.output_dir, &file_name, &report)?)
    };

    if app.json_output {
        print_json(&report)?;
    } else {
        print_report(&report);
        if let Some(path) = saved {
            eprintln!(
                "\n{}",
                format!("Results saved to: {}", path.display()).bright_green()
            );
        }
    }

    Ok(())
}

fn print_report(report: &EvaluationReport) {
    print_banner("EVALUATION RESULTS");

    let rows: Vec<[String; 6]> = report
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let baseline = report.baseline.as_ref().and_then(|b| b.get(i));
            [
                result.kind.to_string(),
                format!("{}/10", result.score),
                format!("{:.2}s", result.elapsed_secs),
                baseline.map_or("-".into(), |b| format!("{:.2}s", b.elapsed_secs)),
                result.word_count.to_string(),
                baseline.map_or("-".into(), |b| b.word_count.to_string()),
            ]
        })
        .collect();

    println!(
        "{}",
        render_table(
            ["Task Type", "MA Score", "MA Time", "SA Time", "MA Words", "SA Words"],
            &rows
        )
    );

    let summary = &report.summary;
    println!("\n{}", "Summary Statistics:".bright_cyan());
    println!(
        "Multi-Agent Average Quality Score: {:.2}/10",
        summary.average_score
    );
    println!("Multi-Agent Average Time: {:.2}s", summary.average_time_secs);
    println!(
        "Passed: {} | Failed: {} (threshold {}/10)",
        summary.passed.to_string().bright_green(),
        summary.failed.to_string().bright_red(),
        summary.pass_threshold
    );

    if let Some(ref comparison) = report.comparison {
        println!("Time Overhead: {}", format_pct(comparison.time_overhead_pct));
        println!(
            "Response Length Difference: {}",
            format_pct(comparison.length_difference_pct)
        );
        println!(
            "Completeness Improvement: {}",
            format_pct(comparison.completeness_improvement_pct)
        );
    }

    if let Some(first) = report.results.first() {
        println!(
            "\n{}",
            format!("Sample Response ({}):", first.task_id).bright_cyan()
        );
        println!("{}", preview(&first.response, PREVIEW_CHARS));
    }
}

/// Plain grid table with columns sized to their widest cell
fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = {
        let parts: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("+{}+", parts.join("+"))
    };
    let line = |cells: Vec<&str>| {
        let parts: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!(" {:<width$} ", cell, width = w))
            .collect();
        format!("|{}|", parts.join("|"))
    };

    let mut out = vec![border.clone(), line(headers.to_vec()), border.clone()];
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
        out.push(border.clone());
    }
    out.join("\n")
}
