use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use triad_agent::{Agent, AgentError, AgentSet, Role, Score};
use triad_critic::{Critique, CriticEvaluator, ScoreSource};
use triad_logging::{LogEvent, Logger};

use crate::context::WorkflowContext;
use crate::error::WorkflowError;
use crate::outcome::WorkflowOutcome;

/// Critic score at or above which a draft is accepted without refinement
pub const QUALITY_THRESHOLD: u8 = 7;

/// Refinement passes allowed per query
pub const MAX_REFINEMENTS: usize = 1;

/// States of the pipeline for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Retrieve,
    Synthesize,
    Critique,
    Refine,
    Done,
}

impl Stage {
    /// Transition out of this stage.
    ///
    /// `score` is the latest critic score and `refined` whether the refinement
    /// pass has already run; both only matter when leaving `Critique`.
    pub fn next(self, score: Option<Score>, refined: bool) -> Stage {
        match self {
            Stage::Start => Stage::Retrieve,
            Stage::Retrieve => Stage::Synthesize,
            Stage::Synthesize => Stage::Critique,
            Stage::Critique => match score {
                Some(score) if score.value() >= QUALITY_THRESHOLD => Stage::Done,
                _ if refined => Stage::Done,
                _ => Stage::Refine,
            },
            Stage::Refine => Stage::Synthesize,
            Stage::Done => Stage::Done,
        }
    }
}

/// Orchestrates Retriever → Synthesizer → Critic with at most one refinement pass
pub struct WorkflowRunner<'a> {
    retriever: &'a Agent,
    synthesizer: &'a Agent,
    critic: &'a Agent,
    logger: Arc<Logger>,
}

impl<'a> WorkflowRunner<'a> {
    pub fn new(
        retriever: &'a Agent,
        synthesizer: &'a Agent,
        critic: &'a Agent,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            retriever,
            synthesizer,
            critic,
            logger,
        }
    }

    pub fn from_agents(agents: &'a AgentSet, logger: Arc<Logger>) -> Self {
        Self::new(
            &agents.retriever,
            &agents.synthesizer,
            &agents.critic,
            logger,
        )
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Answer `query`, returning the final draft and its critique.
    ///
    /// Any agent failure aborts the run; nothing partial is returned.
    pub async fn run(&self, query: &str) -> Result<WorkflowOutcome, WorkflowError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WorkflowError::EmptyQuery);
        }

        let result = self.execute(query).await;
        if let Err(ref e) = result {
            warn!(error = %e, "Workflow aborted");
            self.logger.log(&LogEvent::ErrorEncountered {
                stage: e.stage(),
                error: e.to_string(),
            });
        }
        result
    }

    async fn execute(&self, query: &str) -> Result<WorkflowOutcome, WorkflowError> {
        let mut context = WorkflowContext::new(query);

        self.logger.log(&LogEvent::WorkflowStarted {
            session_id: context.session.id().to_string(),
            query: query.to_string(),
        });

        let mut stage = Stage::Start;
        let mut last_critique: Option<Critique> = None;

        loop {
            let refined = context.refinements() >= MAX_REFINEMENTS;
            stage = stage.next(last_critique.as_ref().map(|c| c.score), refined);
            debug!(?stage, iteration = context.iteration, "Entering stage");

            match stage {
                Stage::Start => {}
                Stage::Retrieve => self.run_agent(self.retriever, &mut context).await?,
                Stage::Synthesize => self.run_agent(self.synthesizer, &mut context).await?,
                Stage::Critique => {
                    let critique = self.run_critic(&mut context).await?;
                    last_critique = Some(critique);
                }
                Stage::Refine => {
                    if let Some(ref critique) = last_critique {
                        info!(
                            score = critique.score.value(),
                            threshold = QUALITY_THRESHOLD,
                            "Score below threshold, refining"
                        );
                        self.logger.log(&LogEvent::RefinementStarted {
                            score: critique.score.value(),
                            threshold: QUALITY_THRESHOLD,
                        });
                    }
                    context.iteration += 1;
                }
                Stage::Done => break,
            }
        }

        match last_critique {
            Some(critique) => self.finish(context, critique),
            None => Err(WorkflowError::agent(
                Role::Critic,
                AgentError::MissingContext("critic score"),
            )),
        }
    }

    async fn run_agent(
        &self,
        agent: &Agent,
        context: &mut WorkflowContext,
    ) -> Result<(), WorkflowError> {
        let role = agent.role();
        let iteration = context.iteration;
        self.logger.log(&LogEvent::StageStarted {
            iteration,
            stage: role,
        });

        let start = Instant::now();
        let (message, completion) = agent
            .respond_with_completion(&context.session)
            .await
            .map_err(|e| WorkflowError::agent(role, e))?;

        self.logger.log(&LogEvent::StageCompleted {
            iteration,
            stage: role,
            duration_secs: start.elapsed().as_secs_f64(),
            response_chars: message.content().chars().count(),
        });

        context.record(message, completion.usage);
        Ok(())
    }

    async fn run_critic(&self, context: &mut WorkflowContext) -> Result<Critique, WorkflowError> {
        let iteration = context.iteration;
        self.logger.log(&LogEvent::StageStarted {
            iteration,
            stage: Role::Critic,
        });

        let start = Instant::now();
        let critique = CriticEvaluator::new(self.critic)
            .evaluate(&context.session)
            .await
            .map_err(WorkflowError::critic)?;

        self.logger.log(&LogEvent::StageCompleted {
            iteration,
            stage: Role::Critic,
            duration_secs: start.elapsed().as_secs_f64(),
            response_chars: critique.text().chars().count(),
        });
        self.logger.log(&LogEvent::CritiqueScored {
            iteration,
            score: critique.score.value(),
            threshold: QUALITY_THRESHOLD,
            defaulted: critique.source == ScoreSource::Default,
        });

        context.record(critique.message.clone(), critique.usage);
        Ok(critique)
    }

    fn finish(
        &self,
        context: WorkflowContext,
        critique: Critique,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let final_message = context
            .session
            .latest(Role::Synthesizer)
            .cloned()
            .ok_or_else(|| {
                WorkflowError::agent(
                    Role::Synthesizer,
                    AgentError::MissingContext("synthesized response"),
                )
            })?;

        let iterations = context.refinements() + 1;
        let duration = context.elapsed();

        self.logger.log(&LogEvent::WorkflowCompleted {
            iterations,
            score: critique.score.value(),
            duration_secs: duration.as_secs_f64(),
        });

        Ok(WorkflowOutcome {
            query: context
                .session
                .query()
                .unwrap_or_default()
                .to_string(),
            final_message,
            critique: critique.text().to_string(),
            score: critique.score,
            score_source: critique.source,
            iterations,
            total_duration_secs: duration.as_secs_f64(),
            stages: context.stages,
            usage: context.usage,
            session: Some(context.session),
        })
    }
}
