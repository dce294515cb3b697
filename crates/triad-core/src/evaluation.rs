use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use triad_logging::LogEvent;

use crate::baseline::SingleAgentBaseline;
use crate::error::WorkflowError;
use crate::metrics::{completeness, mean, percent_change, round_to, word_count};
use crate::tasks::{EvaluationTask, TaskKind};
use crate::workflow::{WorkflowRunner, QUALITY_THRESHOLD};

/// Pipeline result for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub task_id: String,
    pub kind: TaskKind,
    pub query: String,
    pub response: String,
    pub score: u8,
    pub elapsed_secs: f64,
    pub iterations: usize,
    pub word_count: usize,
    pub completeness: f64,
}

/// Single-call baseline result for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineResult {
    pub task_id: String,
    pub response: String,
    pub elapsed_secs: f64,
    pub word_count: usize,
    pub completeness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub tasks: usize,
    pub average_score: f64,
    pub average_time_secs: f64,
    pub average_word_count: f64,
    pub average_completeness: f64,
    pub pass_threshold: u8,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSummary {
    pub average_time_secs: f64,
    pub average_word_count: f64,
    pub average_completeness: f64,
}

/// Pipeline averages relative to the baseline, in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub time_overhead_pct: Option<f64>,
    pub length_difference_pct: Option<f64>,
    pub completeness_improvement_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub results: Vec<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Vec<BaselineResult>>,
    pub summary: EvaluationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_summary: Option<BaselineSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    pub generated_at: DateTime<Utc>,
}

/// Runs the pipeline (and optionally the baseline) over a task list, one task at a time
pub struct Evaluator<'a> {
    runner: &'a WorkflowRunner<'a>,
    baseline: Option<&'a SingleAgentBaseline>,
    delay: Duration,
    pass_threshold: u8,
}

impl<'a> Evaluator<'a> {
    pub fn new(runner: &'a WorkflowRunner<'a>) -> Self {
        Self {
            runner,
            baseline: None,
            delay: Duration::ZERO,
            pass_threshold: QUALITY_THRESHOLD,
        }
    }

    pub fn with_baseline(mut self, baseline: &'a SingleAgentBaseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Pause between consecutive tasks
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_pass_threshold(mut self, threshold: u8) -> Self {
        self.pass_threshold = threshold;
        self
    }

    /// Evaluate every task in order. The first failure aborts the evaluation.
    pub async fn run(&self, tasks: &[EvaluationTask]) -> Result<EvaluationReport, WorkflowError> {
        let logger = self.runner.logger();
        let total = tasks.len();
        let mut results = Vec::with_capacity(total);
        let mut baseline_results = self.baseline.map(|_| Vec::with_capacity(total));

        for (index, task) in tasks.iter().enumerate() {
            logger.log(&LogEvent::TaskStarted {
                index: index + 1,
                total,
                task_id: task.id.clone(),
                kind: task.kind.to_string(),
                query: task.query.clone(),
            });

            let outcome = self.runner.run(&task.query).await?;
            let response = outcome.final_response().to_string();
            let result = EvaluationResult {
                task_id: task.id.clone(),
                kind: task.kind,
                query: task.query.clone(),
                word_count: word_count(&response),
                completeness: completeness(&response, &task.query),
                response,
                score: outcome.score.value(),
                elapsed_secs: round_to(outcome.total_duration_secs, 2),
                iterations: outcome.iterations,
            };

            logger.log(&LogEvent::TaskCompleted {
                task_id: task.id.clone(),
                score: result.score,
                iterations: result.iterations,
                duration_secs: outcome.total_duration_secs,
            });
            results.push(result);

            if let (Some(baseline), Some(collected)) = (self.baseline, baseline_results.as_mut()) {
                let outcome = baseline.run(&task.query).await?;
                collected.push(BaselineResult {
                    task_id: task.id.clone(),
                    word_count: word_count(&outcome.response),
                    completeness: completeness(&outcome.response, &task.query),
                    response: outcome.response,
                    elapsed_secs: round_to(outcome.total_duration_secs, 2),
                });
            }

            if index + 1 < total && !self.delay.is_zero() {
                debug!(delay_ms = self.delay.as_millis() as u64, "Pausing before next task");
                tokio::time::sleep(self.delay).await;
            }
        }

        let summary = summarize(&results, self.pass_threshold);
        let baseline_summary = baseline_results.as_deref().map(summarize_baseline);
        let comparison = baseline_summary
            .as_ref()
            .map(|baseline| compare(&summary, baseline));

        info!(
            tasks = summary.tasks,
            average_score = summary.average_score,
            passed = summary.passed,
            "Evaluation complete"
        );
        logger.log(&LogEvent::EvaluationCompleted {
            tasks: summary.tasks,
            average_score: summary.average_score,
            passed: summary.passed,
            failed: summary.failed,
        });

        Ok(EvaluationReport {
            results,
            baseline: baseline_results,
            summary,
            baseline_summary,
            comparison,
            generated_at: Utc::now(),
        })
    }
}

pub fn summarize(results: &[EvaluationResult], pass_threshold: u8) -> EvaluationSummary {
    let passed = results
        .iter()
        .filter(|r| r.score >= pass_threshold)
        .count();

    EvaluationSummary {
        tasks: results.len(),
        average_score: round_to(mean(results.iter().map(|r| f64::from(r.score))), 2),
        average_time_secs: round_to(mean(results.iter().map(|r| r.elapsed_secs)), 2),
        average_word_count: round_to(mean(results.iter().map(|r| r.word_count as f64)), 1),
        average_completeness: round_to(mean(results.iter().map(|r| r.completeness)), 2),
        pass_threshold,
        passed,
        failed: results.len() - passed,
    }
}

pub fn summarize_baseline(results: &[BaselineResult]) -> BaselineSummary {
    BaselineSummary {
        average_time_secs: round_to(mean(results.iter().map(|r| r.elapsed_secs)), 2),
        average_word_count: round_to(mean(results.iter().map(|r| r.word_count as f64)), 1),
        average_completeness: round_to(mean(results.iter().map(|r| r.completeness)), 2),
    }
}

pub fn compare(summary: &EvaluationSummary, baseline: &BaselineSummary) -> Comparison {
    Comparison {
        time_overhead_pct: percent_change(summary.average_time_secs, baseline.average_time_secs),
        length_difference_pct: percent_change(
            summary.average_word_count,
            baseline.average_word_count,
        ),
        completeness_improvement_pct: percent_change(
            summary.average_completeness,
            baseline.average_completeness,
        ),
    }
}
