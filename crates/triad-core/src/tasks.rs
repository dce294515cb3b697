use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::TaskError;

/// Category label for an evaluation task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Explanation,
    Comparison,
    Planning,
    Analysis,
    #[default]
    #[serde(other)]
    Other,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Explanation => "explanation",
            TaskKind::Comparison => "comparison",
            TaskKind::Planning => "planning",
            TaskKind::Analysis => "analysis",
            TaskKind::Other => "other",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationTask {
    pub id: String,
    pub query: String,
    #[serde(default, alias = "type")]
    pub kind: TaskKind,
}

impl EvaluationTask {
    pub fn new(id: impl Into<String>, query: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            kind,
        }
    }
}

/// The built-in evaluation set
pub fn default_tasks() -> Vec<EvaluationTask> {
    vec![
        EvaluationTask::new(
            "task_1",
            "Explain the difference between supervised and unsupervised learning in machine learning.",
            TaskKind::Explanation,
        ),
        EvaluationTask::new(
            "task_2",
            "What are the main advantages and disadvantages of electric vehicles compared to gasoline cars?",
            TaskKind::Comparison,
        ),
        EvaluationTask::new(
            "task_3",
            "Create a step-by-step plan for someone who wants to learn web development from scratch.",
            TaskKind::Planning,
        ),
        EvaluationTask::new(
            "task_4",
            "Explain how photosynthesis works and why it's important for life on Earth.",
            TaskKind::Explanation,
        ),
        EvaluationTask::new(
            "task_5",
            "What are the key considerations when choosing between SQL and NoSQL databases for a new project?",
            TaskKind::Analysis,
        ),
    ]
}

/// Load a task list from a `.json` file, or YAML for any other extension
pub fn load_tasks(path: &Path) -> Result<Vec<EvaluationTask>, TaskError> {
    let content = std::fs::read_to_string(path).map_err(|source| TaskError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let tasks: Vec<EvaluationTask> = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    validate_tasks(&tasks)?;
    Ok(tasks)
}

fn validate_tasks(tasks: &[EvaluationTask]) -> Result<(), TaskError> {
    if tasks.is_empty() {
        return Err(TaskError::Empty);
    }
    if let Some(task) = tasks.iter().find(|t| t.query.trim().is_empty()) {
        return Err(TaskError::EmptyQuery(task.id.clone()));
    }
    Ok(())
}
