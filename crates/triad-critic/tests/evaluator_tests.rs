use std::sync::Arc;

use async_trait::async_trait;
use triad_agent::{
    Agent, AgentError, AgentSettings, Completion, CompletionRequest, LlmClient, LlmError,
    Message, Role, Session,
};
use triad_critic::{CriticEvaluator, EvaluationError, ScoreError, ScoreSource};

struct FixedClient(&'static str);

#[async_trait]
impl LlmClient for FixedClient {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        Ok(Completion::new(self.0, &request.model))
    }
}

struct DownClient;

#[async_trait]
impl LlmClient for DownClient {
    fn name(&self) -> &str {
        "down"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "overloaded".into(),
        })
    }
}

fn critic(client: Arc<dyn LlmClient>) -> Agent {
    Agent::new(
        Role::Critic,
        "You are a critic.",
        client,
        AgentSettings {
            model: "test".into(),
            max_tokens: 100,
            temperature: 0.0,
        },
    )
}

fn drafted_session() -> Session {
    let mut session = Session::new("What is quantum computing?");
    session.push(Message::new(Role::Retriever, "qubits"));
    session.push(Message::new(Role::Synthesizer, "Quantum computers use qubits."));
    session
}

#[tokio::test]
async fn test_evaluate_scores_and_builds_critic_message() {
    let agent = critic(Arc::new(FixedClient("Score: 8/10\nClear and accurate.")));
    let critique = CriticEvaluator::new(&agent)
        .evaluate(&drafted_session())
        .await
        .unwrap();

    assert_eq!(critique.score.value(), 8);
    assert_eq!(critique.source, ScoreSource::Parsed);
    assert_eq!(critique.message.role(), Role::Critic);
    assert_eq!(critique.message.score(), Some(critique.score));
    assert!(critique.text().contains("Clear and accurate."));
    assert!(critique.passes(7));
    assert!(!critique.passes(9));
}

#[tokio::test]
async fn test_out_of_range_score_is_an_error() {
    let agent = critic(Arc::new(FixedClient("Score: 11/10")));
    let err = CriticEvaluator::new(&agent)
        .evaluate(&drafted_session())
        .await
        .unwrap_err();

    assert!(matches!(err, EvaluationError::Score(ScoreError::OutOfRange(11))));
}

#[tokio::test]
async fn test_missing_score_uses_default() {
    let agent = critic(Arc::new(FixedClient("Reasonable answer.")));
    let critique = CriticEvaluator::new(&agent)
        .evaluate(&drafted_session())
        .await
        .unwrap();

    assert_eq!(critique.source, ScoreSource::Default);
    assert_eq!(critique.score.value(), triad_critic::DEFAULT_SCORE);
}

#[tokio::test]
async fn test_api_failure_propagates() {
    let agent = critic(Arc::new(DownClient));
    let err = CriticEvaluator::new(&agent)
        .evaluate(&drafted_session())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EvaluationError::Agent(AgentError::Llm(LlmError::Api { status: 503, .. }))
    ));
}

#[tokio::test]
async fn test_rejects_non_critic_agent() {
    let agent = Agent::new(
        Role::Synthesizer,
        "sys",
        Arc::new(FixedClient("Score: 9/10")),
        AgentSettings {
            model: "test".into(),
            max_tokens: 100,
            temperature: 0.0,
        },
    );
    let err = CriticEvaluator::new(&agent)
        .evaluate(&drafted_session())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EvaluationError::Agent(AgentError::UnsupportedRole(Role::Synthesizer))
    ));
}
