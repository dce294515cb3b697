use serde::{Deserialize, Serialize};
use triad_agent::{Message, Role, Score, Session, TokenUsage};
use triad_critic::ScoreSource;

/// The result of answering one query with the three-agent pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub query: String,
    /// The last synthesizer message
    pub final_message: Message,
    /// The critic's text for the final draft
    pub critique: String,
    pub score: Score,
    pub score_source: ScoreSource,
    /// 1 without refinement, 2 with
    pub iterations: usize,
    pub total_duration_secs: f64,
    /// Agent calls in the order they happened
    pub stages: Vec<Role>,
    pub usage: TokenUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

impl WorkflowOutcome {
    pub fn final_response(&self) -> &str {
        self.final_message.content()
    }

    pub fn refined(&self) -> bool {
        self.iterations > 1
    }

    /// Drop the full transcript (e.g., before serializing a compact report)
    pub fn without_session(mut self) -> Self {
        self.session = None;
        self
    }
}

/// The result of the single-shot comparison call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineOutcome {
    pub query: String,
    pub response: String,
    pub total_duration_secs: f64,
    pub usage: TokenUsage,
}
