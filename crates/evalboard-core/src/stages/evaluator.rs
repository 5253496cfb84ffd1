//! Pluggable scoring strategy used by the runner.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::{EvalError, ScoreSummary, Submission};

/// Scores a submission's payload against its benchmark.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, submission: &Submission) -> Result<ScoreSummary, EvalError>;
}

/// Fixed scorer: every submission gets `1.0` and `accuracy = 1.0`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderEvaluator;

impl PlaceholderEvaluator {
    pub const SCORE: f64 = 1.0;
}

#[async_trait]
impl Evaluator for PlaceholderEvaluator {
    async fn evaluate(&self, _submission: &Submission) -> Result<ScoreSummary, EvalError> {
        Ok(ScoreSummary::new(
            Self::SCORE,
            BTreeMap::from([("accuracy".to_string(), Self::SCORE)]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_scores_one() {
        let s = Submission::new("a1".into(), "b1".into(), "x".into());
        let summary = PlaceholderEvaluator.evaluate(&s).await.unwrap();
        assert_eq!(summary.score, 1.0);
        assert_eq!(summary.metrics.get("accuracy"), Some(&1.0));
    }
}
