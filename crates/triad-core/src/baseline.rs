use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use triad_agent::{AgentError, AgentSettings, CompletionRequest, LlmClient};
use triad_logging::{LogEvent, Logger};

use crate::error::WorkflowError;
use crate::outcome::BaselineOutcome;

pub const BASELINE_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Answer the question comprehensively.";

/// One direct model call per query, used as the comparison point for the pipeline
pub struct SingleAgentBaseline {
    client: Arc<dyn LlmClient>,
    settings: AgentSettings,
    logger: Arc<Logger>,
}

impl SingleAgentBaseline {
    pub fn new(client: Arc<dyn LlmClient>, settings: AgentSettings) -> Self {
        Self {
            client,
            settings,
            logger: Arc::new(Logger::silent()),
        }
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub async fn run(&self, query: &str) -> Result<BaselineOutcome, WorkflowError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WorkflowError::EmptyQuery);
        }

        self.logger.log(&LogEvent::BaselineStarted);
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system: BASELINE_SYSTEM_PROMPT.to_string(),
            prompt: query.to_string(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let start = Instant::now();
        let completion = match self.client.complete(&request).await {
            Ok(completion) => completion,
            Err(e) => {
                let error = WorkflowError::Baseline(AgentError::Llm(e));
                self.logger.log(&LogEvent::ErrorEncountered {
                    stage: None,
                    error: error.to_string(),
                });
                return Err(error);
            }
        };
        let elapsed = start.elapsed();

        let response = completion.text.trim().to_string();
        debug!(
            client = self.client.name(),
            chars = response.len(),
            "Baseline response received"
        );
        self.logger.log(&LogEvent::BaselineCompleted {
            duration_secs: elapsed.as_secs_f64(),
            response_chars: response.chars().count(),
        });

        Ok(BaselineOutcome {
            query: query.to_string(),
            response,
            total_duration_secs: elapsed.as_secs_f64(),
            usage: completion.usage,
        })
    }
}
