use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use triad_agent::{
    Agent, AgentSettings, Completion, CompletionRequest, LlmClient, LlmError, Role, TokenUsage,
};
use triad_core::{
    default_tasks, EvaluationTask, Evaluator, SingleAgentBaseline, TaskKind, WorkflowError,
    WorkflowRunner, BASELINE_SYSTEM_PROMPT,
};
use triad_logging::{LogFormat, Logger};

type CallLog = Arc<Mutex<Vec<(String, String)>>>;

/// Replies from a fixed script, recording every request in a shared log.
struct ScriptedClient {
    label: &'static str,
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    log: CallLog,
}

impl ScriptedClient {
    fn new(label: &'static str, replies: Vec<Result<String, LlmError>>, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            label,
            replies: Mutex::new(replies.into()),
            log: Arc::clone(log),
        })
    }

    fn always(label: &'static str, reply: &str, log: &CallLog) -> Arc<Self> {
        Self::new(label, (0..20).map(|_| Ok(reply.to_string())).collect(), log)
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn name(&self) -> &str {
        self.label
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.log
            .lock()
            .unwrap()
            .push((self.label.to_string(), request.prompt.clone()));

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".into())))?;

        let mut completion = Completion::new(reply, &request.model);
        completion.usage = TokenUsage::new(10, 5);
        Ok(completion)
    }
}

fn settings() -> AgentSettings {
    AgentSettings {
        model: "test-model".into(),
        max_tokens: 200,
        temperature: 0.0,
    }
}

struct Fixture {
    retriever: Agent,
    synthesizer: Agent,
    critic: Agent,
    log: CallLog,
}

impl Fixture {
    fn new(critic_replies: Vec<Result<String, LlmError>>) -> Self {
        let log: CallLog = Arc::default();
        let synth_replies = vec![
            Ok("Draft one about qubits.".to_string()),
            Ok("Draft two, now covering superposition.".to_string()),
        ];
        Self {
            retriever: Agent::new(
                Role::Retriever,
                "retrieve",
                ScriptedClient::always("retriever", "Qubits, superposition, entanglement.", &log),
                settings(),
            ),
            synthesizer: Agent::new(
                Role::Synthesizer,
                "synthesize",
                ScriptedClient::new("synthesizer", synth_replies, &log),
                settings(),
            ),
            critic: Agent::new(
                Role::Critic,
                "critique",
                ScriptedClient::new("critic", critic_replies, &log),
                settings(),
            ),
            log,
        }
    }

    fn with_scores(scores: &[u8]) -> Self {
        Self::new(
            scores
                .iter()
                .map(|s| Ok(format!("Score: {s}/10\nSome feedback.")))
                .collect(),
        )
    }

    /// Replace the two-draft synthesizer script with one that never runs out
    fn steady_drafts(mut self, draft: &str) -> Self {
        self.synthesizer = Agent::new(
            Role::Synthesizer,
            "synthesize",
            ScriptedClient::always("synthesizer", draft, &self.log),
            settings(),
        );
        self
    }

    fn runner(&self) -> WorkflowRunner<'_> {
        self.runner_with(Logger::silent())
    }

    fn runner_with(&self, logger: Logger) -> WorkflowRunner<'_> {
        WorkflowRunner::new(
            &self.retriever,
            &self.synthesizer,
            &self.critic,
            Arc::new(logger),
        )
    }

    fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(l, _)| l.clone()).collect()
    }
}

#[tokio::test]
async fn test_high_score_finishes_in_one_pass() {
    let fixture = Fixture::with_scores(&[8]);
    let outcome = fixture.runner().run("What is quantum computing?").await.unwrap();

    assert_eq!(
        outcome.stages,
        vec![Role::Retriever, Role::Synthesizer, Role::Critic]
    );
    assert_eq!(outcome.iterations, 1);
    assert!(!outcome.refined());
    assert_eq!(outcome.score.value(), 8);
    assert_eq!(outcome.final_response(), "Draft one about qubits.");
    assert_eq!(outcome.usage.total(), 45);
    assert_eq!(fixture.calls(), vec!["retriever", "synthesizer", "critic"]);
}

#[tokio::test]
async fn test_low_score_triggers_one_refinement() {
    let fixture = Fixture::with_scores(&[5, 9]);
    let outcome = fixture.runner().run("What is quantum computing?").await.unwrap();

    assert_eq!(
        outcome.stages,
        vec![
            Role::Retriever,
            Role::Synthesizer,
            Role::Critic,
            Role::Synthesizer,
            Role::Critic
        ]
    );
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.score.value(), 9);
    assert_eq!(
        outcome.final_response(),
        "Draft two, now covering superposition."
    );

    // The refinement prompt carries the first draft and its critique
    let log = fixture.log.lock().unwrap();
    let (label, prompt) = &log[3];
    assert_eq!(label, "synthesizer");
    assert!(prompt.contains("Draft one about qubits."));
    assert!(prompt.contains("Some feedback."));
}

#[tokio::test]
async fn test_refinement_is_capped_at_one() {
    let fixture = Fixture::with_scores(&[3, 2, 1]);
    let outcome = fixture.runner().run("What is quantum computing?").await.unwrap();

    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.score.value(), 2);
    let synth_calls = fixture.calls().iter().filter(|c| *c == "synthesizer").count();
    assert_eq!(synth_calls, 2);
}

#[tokio::test]
async fn test_threshold_score_is_accepted() {
    let fixture = Fixture::with_scores(&[7]);
    let outcome = fixture.runner().run("Explain photosynthesis").await.unwrap();
    assert_eq!(outcome.iterations, 1);
}

#[tokio::test]
async fn test_missing_score_uses_default() {
    let fixture = Fixture::new(vec![Ok("Looks fine to me.".to_string())]);
    let outcome = fixture.runner().run("Explain photosynthesis").await.unwrap();

    assert_eq!(outcome.score.value(), triad_critic::DEFAULT_SCORE);
    assert_eq!(outcome.score_source, triad_critic::ScoreSource::Default);
    assert_eq!(outcome.iterations, 1);
}

#[tokio::test]
async fn test_out_of_range_score_is_configuration_error() {
    let fixture = Fixture::with_scores(&[42]);
    let err = fixture.runner().run("What is quantum computing?").await.unwrap_err();
    assert!(matches!(err, WorkflowError::Configuration(_)));
}

#[tokio::test]
async fn test_api_failure_aborts_run() {
    let fixture = Fixture::new(vec![Err(LlmError::RateLimited("slow down".into()))]);
    let err = fixture.runner().run("What is quantum computing?").await.unwrap_err();

    assert_eq!(err.stage(), Some(Role::Critic));
    assert!(err.llm_error().is_some_and(LlmError::is_rate_limited));
    assert!(err.hint().is_some());
    assert_eq!(fixture.calls(), vec!["retriever", "synthesizer", "critic"]);
}

#[tokio::test]
async fn test_empty_query_is_rejected_without_calls() {
    let fixture = Fixture::with_scores(&[8]);
    let err = fixture.runner().run("   ").await.unwrap_err();

    assert!(matches!(err, WorkflowError::EmptyQuery));
    assert!(fixture.calls().is_empty());
}

#[tokio::test]
async fn test_session_is_returned_in_order() {
    let fixture = Fixture::with_scores(&[5, 8]);
    let outcome = fixture.runner().run("What is quantum computing?").await.unwrap();
    let session = outcome.session.as_ref().unwrap();

    let roles: Vec<Role> = session.messages().iter().map(|m| m.role()).collect();
    assert_eq!(roles[0], Role::User);
    assert_eq!(&roles[1..], outcome.stages.as_slice());
    assert_eq!(session.query(), Some("What is quantum computing?"));
    assert!(outcome.without_session().session.is_none());
}

#[tokio::test]
async fn test_evaluation_runs_tasks_in_order() {
    let fixture = Fixture::with_scores(&[8, 5, 6, 9]).steady_drafts("Rust is a systems language.");
    let runner = fixture.runner();
    let tasks = vec![
        EvaluationTask::new("first", "What is Rust?", TaskKind::Explanation),
        EvaluationTask::new("second", "Compare Rust and Go", TaskKind::Comparison),
        EvaluationTask::new("third", "Plan a Rust course", TaskKind::Planning),
    ];

    let report = Evaluator::new(&runner).run(&tasks).await.unwrap();

    let ids: Vec<&str> = report.results.iter().map(|r| r.task_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
    assert_eq!(report.results[0].iterations, 1);
    assert_eq!(report.results[1].iterations, 2);
    assert_eq!(report.results[1].score, 6);
    assert_eq!(report.results[2].score, 9);
    assert_eq!(report.summary.tasks, 3);
    assert_eq!(report.summary.passed, 2);
    assert_eq!(report.summary.failed, 1);
    assert!(report.baseline.is_none());
    assert!(report.comparison.is_none());

    let retriever_prompts: Vec<String> = fixture
        .log
        .lock()
        .unwrap()
        .iter()
        .filter(|(label, _)| label == "retriever")
        .map(|(_, prompt)| prompt.clone())
        .collect();
    assert_eq!(retriever_prompts.len(), 3);
    assert!(retriever_prompts[0].contains("What is Rust?"));
    assert!(retriever_prompts[2].contains("Plan a Rust course"));
}

#[tokio::test]
async fn test_evaluation_with_baseline_and_delay() {
    let fixture = Fixture::new((0..5).map(|_| Ok("Score: 9/10".to_string())).collect())
        .steady_drafts("A full answer.");
    let runner = fixture.runner();
    let baseline = SingleAgentBaseline::new(
        ScriptedClient::always("baseline", "Short answer.", &fixture.log),
        settings(),
    );

    let tasks = default_tasks();
    let report = Evaluator::new(&runner)
        .with_baseline(&baseline)
        .with_delay(Duration::from_millis(1))
        .with_pass_threshold(10)
        .run(&tasks)
        .await
        .unwrap();

    assert_eq!(report.results.len(), tasks.len());
    let baseline_results = report.baseline.as_ref().unwrap();
    assert_eq!(baseline_results.len(), tasks.len());
    assert_eq!(baseline_results[0].word_count, 2);
    assert_eq!(report.summary.failed, tasks.len());
    assert!(report.comparison.is_some());

    // Pipeline then baseline, task by task
    let calls = fixture.calls();
    assert_eq!(
        &calls[..5],
        &["retriever", "synthesizer", "critic", "baseline", "retriever"]
    );
}

#[tokio::test]
async fn test_evaluation_stops_on_first_failure() {
    let fixture = Fixture::new(vec![
        Ok("Score: 8/10".to_string()),
        Err(LlmError::Authentication("bad key".into())),
    ])
    .steady_drafts("Answer.");
    let runner = fixture.runner();

    let err = Evaluator::new(&runner)
        .run(&default_tasks())
        .await
        .unwrap_err();
    assert!(err.llm_error().is_some_and(LlmError::is_authentication));
    assert_eq!(
        fixture.calls().iter().filter(|c| *c == "retriever").count(),
        2
    );
}

#[tokio::test]
async fn test_baseline_uses_fixed_system_prompt() {
    struct EchoSystem;

    #[async_trait]
    impl LlmClient for EchoSystem {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
            Ok(Completion::new(
                format!("  {}|{}  ", request.system, request.prompt),
                &request.model,
            ))
        }
    }

    let baseline = SingleAgentBaseline::new(Arc::new(EchoSystem), settings());
    let outcome = baseline.run(" Why is the sky blue? ").await.unwrap();

    assert_eq!(outcome.query, "Why is the sky blue?");
    assert_eq!(
        outcome.response,
        format!("{BASELINE_SYSTEM_PROMPT}|Why is the sky blue?")
    );
}

#[tokio::test]
async fn test_evaluation_events_number_tasks_from_one() {
    let dir = tempfile::TempDir::new().unwrap();
    let log_path = dir.path().join("events.jsonl");

    let fixture = Fixture::with_scores(&[8, 8]).steady_drafts("An answer.");
    let runner = fixture.runner_with(Logger::with_file(LogFormat::Compact, &log_path).unwrap());
    let tasks = vec![
        EvaluationTask::new("a", "What is Rust?", TaskKind::Explanation),
        EvaluationTask::new("b", "What is Go?", TaskKind::Explanation),
    ];
    Evaluator::new(&runner).run(&tasks).await.unwrap();

    let content = std::fs::read_to_string(&log_path).unwrap();
    let started: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .filter(|event| event["event"] == "task_started")
        .collect();

    assert_eq!(started.len(), 2);
    assert_eq!(started[0]["index"], 1);
    assert_eq!(started[0]["task_id"], "a");
    assert_eq!(started[1]["index"], 2);
    assert_eq!(started[1]["total"], 2);
}
