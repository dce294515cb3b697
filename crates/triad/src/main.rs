mod config;
mod demo;
mod evaluate;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use triad_agent::{
    create_client, AgentSet, AgentSettings, ConfigError, ConfigOverrides, LlmClient, ModelConfig,
    PromptTemplates,
};
use triad_core::{SingleAgentBaseline, WorkflowError, WorkflowRunner};
use triad_logging::{init_tracing, LogFormat, Logger};

use crate::config::ProjectConfig;
use crate::demo::{handle_demo_command, DemoMode};
use crate::evaluate::{handle_evaluate_command, EvaluateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "triad",
    about = "Retriever, synthesizer and critic agents answering questions together",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Model to use (overrides MODEL_NAME)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Maximum tokens per response (overrides MAX_TOKENS)
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Sampling temperature, 0.0 to 2.0 (overrides TEMPERATURE)
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// YAML file with the agents' system prompts
    #[arg(long, global = true)]
    prompts: Option<PathBuf>,

    /// Directory for saved results (default: outputs)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Also append progress events as JSON lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Show debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output final result as JSON
    #[arg(long, global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the demo
    Demo {
        #[arg(long, value_enum, default_value = "simple")]
        mode: DemoMode,

        /// Question to ask instead of the built-in ones
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Evaluate the pipeline over a task set
    Evaluate(EvaluateArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Everything a command needs, built once at startup
pub struct App {
    pub agents: AgentSet,
    pub client: Arc<dyn LlmClient>,
    pub settings: AgentSettings,
    pub logger: Arc<Logger>,
    pub output_dir: PathBuf,
    pub json_output: bool,
}

impl App {
    pub fn runner(&self) -> WorkflowRunner<'_> {
        WorkflowRunner::from_agents(&self.agents, Arc::clone(&self.logger))
    }

    pub fn baseline(&self) -> SingleAgentBaseline {
        SingleAgentBaseline::new(Arc::clone(&self.client), self.settings.clone())
            .with_logger(Arc::clone(&self.logger))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(if cli.verbose { "debug" } else { "warn" }, log_format);

    let result = run(cli).await;
    if let Err(ref e) = result {
        if let Some(hint) = hint_for(e) {
            eprintln!("{} {}", "hint:".bright_yellow().bold(), hint);
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let app = build_app(&cli)?;

    match cli.command {
        Commands::Demo { mode, query } => handle_demo_command(&app, mode, query).await,
        Commands::Evaluate(args) => handle_evaluate_command(&app, args).await,
    }
}

fn build_app(cli: &Cli) -> Result<App> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let project = ProjectConfig::load(&working_dir)?.unwrap_or_default();

    let overrides = ConfigOverrides {
        model_name: cli.model.clone(),
        max_tokens: cli.max_tokens,
        temperature: cli.temperature,
        ..Default::default()
    };
    let config = ModelConfig::from_env(overrides, project.model_fallback())
        .context("Invalid model configuration")?;
    tracing::debug!(?config, "Loaded model configuration");

    let prompts_path = cli.prompts.as_deref().or(project.prompts.as_deref());
    let templates =
        PromptTemplates::load_or_default(prompts_path).context("Failed to load prompt templates")?;

    let client = create_client(&config).context("Failed to create API client")?;
    let settings = AgentSettings::from(&config);
    let agents = AgentSet::new(&templates, Arc::clone(&client), settings.clone())?;

    let log_format: LogFormat = cli.log_format.into();
    let logger = match cli.log_file {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };

    let output_dir = cli
        .output_dir
        .clone()
        .or(project.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    Ok(App {
        agents,
        client,
        settings,
        logger: Arc::new(logger),
        output_dir,
        json_output: cli.json_output,
    })
}

fn hint_for(error: &anyhow::Error) -> Option<&'static str> {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<WorkflowError>() {
            return e.hint();
        }
        if let Some(ConfigError::MissingVar(_)) = cause.downcast_ref::<ConfigError>() {
            return Some("Set OPENAI_API_KEY in your environment or in a .env file.");
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_evaluate_flags() {
        let cli = Cli::try_parse_from([
            "triad",
            "--model",
            "gpt-4o",
            "evaluate",
            "--no-baseline",
            "--delay-ms",
            "0",
            "--pass-threshold",
            "8",
        ])
        .unwrap();

        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
        match cli.command {
            Commands::Evaluate(args) => {
                assert!(args.no_baseline);
                assert!(!args.no_save);
                assert_eq!(args.delay_ms, 0);
                assert_eq!(args.pass_threshold, 8);
            }
            other => panic!("expected evaluate, got {other:?}"),
        }
    }

    #[test]
    fn test_demo_defaults_to_simple() {
        let cli = Cli::try_parse_from(["triad", "demo"]).unwrap();
        match cli.command {
            Commands::Demo { mode, query } => {
                assert_eq!(mode, DemoMode::Simple);
                assert!(query.is_none());
            }
            other => panic!("expected demo, got {other:?}"),
        }
    }

    #[test]
    fn test_pass_threshold_out_of_range_is_rejected() {
        let result = Cli::try_parse_from(["triad", "evaluate", "--pass-threshold", "11"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_hint_for_missing_key() {
        let error = anyhow::Error::new(ConfigError::MissingVar("OPENAI_API_KEY".into()))
            .context("Invalid model configuration");
        assert!(hint_for(&error).is_some());
    }
}
