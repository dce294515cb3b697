use std::path::PathBuf;
use thiserror::Error;

use triad_agent::{AgentError, LlmError, Role};
use triad_critic::{EvaluationError, ScoreError};

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{stage} agent failed: {source}")]
    Agent {
        stage: Role,
        #[source]
        source: AgentError,
    },

    #[error("Baseline call failed: {0}")]
    Baseline(#[source] AgentError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ScoreError),

    #[error("Query must not be empty")]
    EmptyQuery,
}

impl WorkflowError {
    pub(crate) fn agent(stage: Role, source: AgentError) -> Self {
        Self::Agent { stage, source }
    }

    pub(crate) fn critic(error: EvaluationError) -> Self {
        match error {
            EvaluationError::Agent(source) => Self::agent(Role::Critic, source),
            EvaluationError::Score(e) => Self::Configuration(e),
        }
    }

    /// Stage whose agent call failed, if any
    pub fn stage(&self) -> Option<Role> {
        match self {
            Self::Agent { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The API error behind this failure, if it came from the model call
    pub fn llm_error(&self) -> Option<&LlmError> {
        match self {
            Self::Agent { source, .. } | Self::Baseline(source) => source.llm_error(),
            _ => None,
        }
    }

    /// Suggested manual mitigation to print alongside the error
    pub fn hint(&self) -> Option<&'static str> {
        match self.llm_error()? {
            LlmError::RateLimited(_) => Some(
                "Reduce the number of tasks, increase --delay-ms, or switch to a model with a higher rate limit.",
            ),
            LlmError::Authentication(_) => {
                Some("Check that OPENAI_API_KEY is set to a valid key for the configured endpoint.")
            }
            _ => None,
        }
    }
}

/// Errors loading an evaluation task file
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Failed to read task file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON task file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML task file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Task file contains no tasks")]
    Empty,

    #[error("Task '{0}' has an empty query")]
    EmptyQuery(String),
}
