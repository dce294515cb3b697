mod evaluator;
mod score;

pub use evaluator::{Critique, CriticEvaluator, EvaluationError};
pub use score::{extract_score, parse_score, ScoreError, ScoreSource, DEFAULT_SCORE};
