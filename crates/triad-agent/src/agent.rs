use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

use crate::{
    Completion, CompletionRequest, LlmClient, LlmError, Message, ModelConfig, PromptTemplates,
    Role, Session, StagePrompts,
};

/// Errors that can occur while an agent produces a response
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Session is missing {0}")]
    MissingContext(&'static str),

    #[error("Role '{0}' is not an agent role")]
    UnsupportedRole(Role),
}

impl AgentError {
    /// The underlying API error, if this failure came from the model call
    pub fn llm_error(&self) -> Option<&LlmError> {
        match self {
            AgentError::Llm(e) => Some(e),
            _ => None,
        }
    }
}

/// Per-call model settings shared by all agents
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl From<&ModelConfig> for AgentSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model: config.model_name.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// A role-bound wrapper around one call to the text-generation API.
///
/// Agents hold no conversation state of their own: they read the session
/// they are handed and return a new message for the caller to append.
pub struct Agent {
    role: Role,
    system_prompt: String,
    client: Arc<dyn LlmClient>,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        role: Role,
        system_prompt: impl Into<String>,
        client: Arc<dyn LlmClient>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            role,
            system_prompt: system_prompt.into(),
            client,
            settings,
        }
    }

    /// Build an agent for `role` using its system prompt from `templates`
    pub fn from_templates(
        role: Role,
        templates: &PromptTemplates,
        client: Arc<dyn LlmClient>,
        settings: AgentSettings,
    ) -> Result<Self, AgentError> {
        let system_prompt = templates
            .system_prompt(role)
            .ok_or(AgentError::UnsupportedRole(role))?;
        Ok(Self::new(role, system_prompt, client, settings))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Produce this agent's next message for `session`
    pub async fn respond(&self, session: &Session) -> Result<Message, AgentError> {
        let (message, _) = self.respond_with_completion(session).await?;
        Ok(message)
    }

    /// Like [`Agent::respond`], also returning the raw completion (usage, timing).
    pub async fn respond_with_completion(
        &self,
        session: &Session,
    ) -> Result<(Message, Completion), AgentError> {
        let prompt = StagePrompts::build(self.role, session)?;
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system: self.system_prompt.clone(),
            prompt,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        debug!(
            role = %self.role,
            client = self.client.name(),
            prompt_len = request.prompt.len(),
            "Executing agent"
        );

        let start = Instant::now();
        let completion = self.client.complete(&request).await?;

        debug!(
            role = %self.role,
            response_len = completion.text.len(),
            duration_ms = start.elapsed().as_millis(),
            "Agent completed"
        );

        Ok((Message::new(self.role, completion.text.trim()), completion))
    }
}

/// The three pipeline agents sharing one client and one set of settings
pub struct AgentSet {
    pub retriever: Agent,
    pub synthesizer: Agent,
    pub critic: Agent,
}

impl AgentSet {
    pub fn new(
        templates: &PromptTemplates,
        client: Arc<dyn LlmClient>,
        settings: AgentSettings,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            retriever: Agent::from_templates(
                Role::Retriever,
                templates,
                client.clone(),
                settings.clone(),
            )?,
            synthesizer: Agent::from_templates(
                Role::Synthesizer,
                templates,
                client.clone(),
                settings.clone(),
            )?,
            critic: Agent::from_templates(Role::Critic, templates, client, settings)?,
        })
    }
}
