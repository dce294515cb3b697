use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use dialoguer::Input;
use serde::Serialize;

use triad_core::{metrics, BaselineOutcome, WorkflowOutcome};

use crate::output::{print_banner, print_json, print_outcome, save_json, PREVIEW_CHARS};
use crate::App;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DemoMode {
    /// Answer a few predefined questions
    #[default]
    Simple,
    /// Ask questions at a prompt until `quit`
    Interactive,
    /// Run the pipeline and a single call side by side
    Comparison,
}

pub const SIMPLE_QUERIES: [&str; 3] = [
    "What is quantum computing and how does it differ from classical computing?",
    "Explain the concept of blockchain in simple terms.",
    "What are the main challenges in developing artificial general intelligence?",
];

pub const COMPARISON_QUERY: &str =
    "What are the key principles of object-oriented programming and how do they improve code quality?";

pub const COMPARISON_FILE: &str = "demo_comparison.json";

pub async fn handle_demo_command(app: &App, mode: DemoMode, query: Option<String>) -> Result<()> {
    match mode {
        DemoMode::Simple => demo_simple(app, query).await,
        DemoMode::Interactive => demo_interactive(app, query).await,
        DemoMode::Comparison => demo_comparison(app, query).await,
    }
}

async fn demo_simple(app: &App, query: Option<String>) -> Result<()> {
    let queries: Vec<String> = match query {
        Some(q) => vec![q],
        None => SIMPLE_QUERIES.iter().map(|q| q.to_string()).collect(),
    };

    if !app.json_output {
        print_banner("Simple Multi-Agent Demo");
    }

    let runner = app.runner();
    let mut outcomes = Vec::with_capacity(queries.len());
    for (i, query) in queries.iter().enumerate() {
        if !app.json_output {
            eprintln!("{}", format!("Query {}: {}", i + 1, query).bright_yellow());
        }

        let outcome = runner.run(query).await?;
        if app.json_output {
            outcomes.push(outcome.without_session());
        } else {
            print_outcome(&outcome, Some(PREVIEW_CHARS));
            println!("\n{}\n", "-".repeat(60));
        }
    }

    if app.json_output {
        print_json(&outcomes)?;
    }
    Ok(())
}

/// Words that end an interactive session
pub fn is_exit_command(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "quit" | "exit" | "q"
    )
}

async fn demo_interactive(app: &App, first: Option<String>) -> Result<()> {
    print_banner("Multi-Agent Interactive Demo");
    eprintln!("Enter 'quit' to exit\n");

    let runner = app.runner();
    let mut pending = first;

    loop {
        let query = match pending.take() {
            Some(q) => q,
            None => Input::<String>::new()
                .with_prompt("Enter your question")
                .allow_empty(true)
                .interact_text()
                .context("Failed to read question")?,
        };

        if is_exit_command(&query) {
            eprintln!("{}", "Goodbye!".bright_green());
            break;
        }
        if query.trim().is_empty() {
            continue;
        }

        let outcome = runner.run(&query).await?;
        if app.json_output {
            print_json(&outcome.without_session())?;
        } else {
            print_outcome(&outcome, None);
            println!("\n{}\n", "=".repeat(60));
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ComparisonMetrics {
    pub time_overhead_pct: Option<f64>,
    pub length_difference_pct: Option<f64>,
    pub completeness_improvement_pct: Option<f64>,
}

impl ComparisonMetrics {
    pub fn between(query: &str, multi: &WorkflowOutcome, single: &BaselineOutcome) -> Self {
        let words = |text: &str| metrics::word_count(text) as f64;
        Self {
            time_overhead_pct: metrics::percent_change(
                multi.total_duration_secs,
                single.total_duration_secs,
            ),
            length_difference_pct: metrics::percent_change(
                words(multi.final_response()),
                words(&single.response),
            ),
            completeness_improvement_pct: metrics::percent_change(
                metrics::completeness(multi.final_response(), query),
                metrics::completeness(&single.response, query),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct DemoComparison {
    query: String,
    multi_agent: WorkflowOutcome,
    single_agent: BaselineOutcome,
    comparison: ComparisonMetrics,
}

async fn demo_comparison(app: &App, query: Option<String>) -> Result<()> {
    let query = query.unwrap_or_else(|| COMPARISON_QUERY.to_string());

    if !app.json_output {
        print_banner("Comparison Demo: Multi-Agent vs Single-Agent");
        eprintln!("{} {}\n", "Query:".bright_yellow(), query);
        eprintln!("{}", "1. MULTI-AGENT APPROACH".bright_blue());
    }
    let multi = app.runner().run(&query).await?.without_session();

    if !app.json_output {
        println!("\n{}", "Multi-Agent Response:".bright_green());
        println!("{}", multi.final_response());
        eprintln!("\n{}", "2. SINGLE-AGENT APPROACH".bright_blue());
    }
    let single = app.baseline().run(&query).await?;

    let comparison = ComparisonMetrics::between(&query, &multi, &single);

    if !app.json_output {
        println!("\n{}", "Single-Agent Response:".bright_green());
        println!("{}", single.response);

        print_banner("COMPARISON RESULTS");
        println!("Multi-Agent Quality Score: {}", multi.score);
        println!("Multi-Agent Time: {:.2}s", multi.total_duration_secs);
        println!("Multi-Agent Iterations: {}", multi.iterations);
        println!("Single-Agent Time: {:.2}s", single.total_duration_secs);
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

    let report = DemoComparison {
        query,
        multi_agent: multi,
        single_agent: single,
        comparison,
    };
    let path = save_json(&app.output_dir, COMPARISON_FILE, &report)?;

    if app.json_output {
        print_json(&report)?;
    } else {
        eprintln!(
            "\n{}",
            format!("Results saved to {}", path.display()).bright_green()
        );
    }
    Ok(())
}

pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => "n/a".to_string(),
    }
}
