use tracing::{debug, info};

use triad_agent::{Agent, AgentError, Message, Role, Score, Session, TokenUsage};

use crate::{parse_score, ScoreError, ScoreSource};

/// A scored critique of the latest synthesizer draft
#[derive(Debug, Clone)]
pub struct Critique {
    /// The critic's message, carrying its score
    pub message: Message,
    pub score: Score,
    pub source: ScoreSource,
    pub usage: TokenUsage,
}

impl Critique {
    pub fn text(&self) -> &str {
        self.message.content()
    }

    pub fn passes(&self, threshold: u8) -> bool {
        self.score.value() >= threshold
    }
}

/// Evaluator that runs the critic agent and scores its reply
pub struct CriticEvaluator<'a> {
    agent: &'a Agent,
}

impl<'a> CriticEvaluator<'a> {
    pub fn new(agent: &'a Agent) -> Self {
        Self { agent }
    }

    /// Critique the latest draft in `session`.
    ///
    /// The session is not modified; append `critique.message` to record it.
    pub async fn evaluate(&self, session: &Session) -> Result<Critique, EvaluationError> {
        if self.agent.role() != Role::Critic {
            return Err(EvaluationError::Agent(AgentError::UnsupportedRole(
                self.agent.role(),
            )));
        }

        debug!(
            drafts = session.count(Role::Synthesizer),
            "Running critic evaluation"
        );

        let (reply, completion) = self.agent.respond_with_completion(session).await?;
        let (score, source) = parse_score(reply.content())?;

        info!(
            score = score.value(),
            source = ?source,
            duration_secs = completion.duration.as_secs_f64(),
            "Critic completed"
        );

        Ok(Critique {
            message: Message::critique(reply.content(), score),
            score,
            source,
            usage: completion.usage,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Score(#[from] ScoreError),
}
