use std::time::{Duration, Instant};

use triad_agent::{Message, Role, Session, TokenUsage};

/// Mutable state for one workflow run. Discarded once the outcome is built.
#[derive(Debug)]
pub struct WorkflowContext {
    /// Conversation for this query
    pub session: Session,
    /// Current pass (0 = initial, 1 = refinement)
    pub iteration: usize,
    /// Every agent call, in order
    pub stages: Vec<Role>,
    /// Token usage summed over all calls
    pub usage: TokenUsage,
    started_at: Instant,
}

impl WorkflowContext {
    pub fn new(query: &str) -> Self {
        Self {
            session: Session::new(query),
            iteration: 0,
            stages: Vec::new(),
            usage: TokenUsage::default(),
            started_at: Instant::now(),
        }
    }

    /// Append an agent's message and note the call
    pub fn record(&mut self, message: Message, usage: TokenUsage) {
        self.stages.push(message.role());
        self.usage += usage;
        self.session.push(message);
    }

    pub fn refinements(&self) -> usize {
        self.session.count(Role::Synthesizer).saturating_sub(1)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
