//! # triad-agent
//!
//! Agents and the message protocol for the triad pipeline.
//!
//! ## Key Types
//!
//! - [`Message`] / [`Session`] - Append-only conversation for one query
//! - [`Agent`] - A role bound to a system prompt and an [`LlmClient`]
//! - [`ModelConfig`] - Credentials and model settings loaded from the environment
//! - [`PromptTemplates`] - Role-keyed system prompts loaded from YAML
//! - [`OpenAiClient`] - `LlmClient` for OpenAI-compatible chat-completions APIs

mod agent;
mod config;
mod message;
mod openai;
mod prompts;
mod templates;
mod traits;

use std::sync::Arc;

pub use agent::{Agent, AgentError, AgentSet, AgentSettings};
pub use config::{
    ConfigError, ConfigOverrides, ModelConfig, API_KEY_VAR, BASE_URL_VAR, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL, DEFAULT_TEMPERATURE, MAX_TOKENS_VAR, MODEL_NAME_VAR, TEMPERATURE_VAR,
};
pub use message::{Message, Role, Score, Session, DEFAULT_CONTEXT_MESSAGES};
pub use openai::{classify_error, parse_completion, OpenAiClient};
pub use prompts::{truncate_output, StagePrompts};
pub use templates::{PromptTemplates, DEFAULT_TEMPLATES};
pub use traits::{Completion, CompletionRequest, LlmClient, LlmError, TokenUsage};

/// Create the HTTP client for the configured endpoint
pub fn create_client(config: &ModelConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    Ok(Arc::new(OpenAiClient::new(config)?))
}
