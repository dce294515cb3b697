//! # triad-core
//!
//! Orchestration for the Retriever → Synthesizer → Critic pipeline.
//!
//! ## Key Types
//!
//! - [`WorkflowRunner`] - Runs one query through the agents, refining once on a low score
//! - [`Stage`] - The pipeline state machine
//! - [`SingleAgentBaseline`] - One direct call, for comparison
//! - [`Evaluator`] - Sequential evaluation over a task list
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use triad_core::WorkflowRunner;
//! use triad_logging::{LogFormat, Logger};
//!
//! let runner = WorkflowRunner::from_agents(&agents, Arc::new(Logger::new(LogFormat::Pretty)));
//! let outcome = runner.run("What is quantum computing?").await?;
//! println!("{} ({})", outcome.final_response(), outcome.score);
//! ```

mod baseline;
mod context;
mod error;
mod evaluation;
pub mod metrics;
mod outcome;
mod tasks;
mod workflow;

pub use baseline::{SingleAgentBaseline, BASELINE_SYSTEM_PROMPT};
pub use context::WorkflowContext;
pub use error::{TaskError, WorkflowError};
pub use evaluation::{
    compare, summarize, summarize_baseline, BaselineResult, BaselineSummary, Comparison,
    EvaluationReport, EvaluationResult, EvaluationSummary, Evaluator,
};
pub use outcome::{BaselineOutcome, WorkflowOutcome};
pub use tasks::{default_tasks, load_tasks, EvaluationTask, TaskKind};
pub use workflow::{Stage, WorkflowRunner, MAX_REFINEMENTS, QUALITY_THRESHOLD};
