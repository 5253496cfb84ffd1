//! Runner stage: executes submitted runs and owns the result store.
//!
//! The runner is the only stage allowed to move a submission out of
//! `submitted`. On `submission.created` it evaluates the payload, persists the
//! terminal submission, and on success publishes `score.calculated`.
//! Persisting and publishing are not transactional: if the publish fails the
//! stored result stays.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use evalboard_store::Store;
use tracing::{instrument, warn};

use crate::bus::{Dispatch, Handler, HandlerError, Message};
use crate::domain::{Submission, SubmissionStatus};
use crate::obs::{emit_message_ignored, emit_publish_failed, emit_run_finished, Instrumentation};
use crate::stages::evaluator::Evaluator;

pub struct Runner {
    /// Keyed by a zero-padded run sequence, not submission id: each delivery
    /// is its own run and snapshots list runs in the order they finished.
    results: Store<Submission>,
    seq: AtomicU64,
    evaluator: Arc<dyn Evaluator>,
    instruments: Instrumentation,
}

impl Runner {
    pub fn new(evaluator: Arc<dyn Evaluator>, instruments: Instrumentation) -> Self {
        Self {
            results: Store::new(),
            seq: AtomicU64::new(0),
            evaluator,
            instruments,
        }
    }

    /// Snapshot of every persisted result, oldest run first.
    pub fn results(&self) -> Vec<Submission> {
        let results = self.results.list();
        self.instruments.metrics().add_counter(
            "runner_results_total",
            &[("result", "ok")],
            results.len() as f64,
        );
        results
    }

    /// Result of the most recent run of a submission, if it was run.
    pub fn latest_for(&self, submission_id: &str) -> Option<Submission> {
        self.results
            .list()
            .into_iter()
            .rev()
            .find(|s| s.id == submission_id)
    }

    async fn run(&self, dispatch: &Dispatch<'_>, submission: Submission) -> Result<(), HandlerError> {
        let started = Instant::now();
        let submission = submission.start();

        let outcome = self.evaluator.evaluate(&submission).await;
        let result = match outcome {
            Ok(summary) => submission.complete(summary, Utc::now()),
            Err(e) => {
                warn!(submission_id = %submission.id, error = %e, "runner: evaluation failed");
                submission.fail(Utc::now())
            }
        };

        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.results
            .save(format!("{seq:020}-{}", result.id), result.clone());
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if result.status == SubmissionStatus::Failed {
            emit_run_finished(&result.id, result.status.as_str(), elapsed_ms);
            self.observe_run(started, "failed");
            return Ok(());
        }

        let submission_id = result.id.clone();
        if let Err(err) = dispatch.publish(Message::ScoreCalculated(result)).await {
            emit_publish_failed(self.instruments.stage(), &submission_id, &err);
            self.observe_run(started, "error");
            return Err(err.into());
        }

        emit_run_finished(&submission_id, SubmissionStatus::Completed.as_str(), elapsed_ms);
        self.observe_run(started, "ok");
        Ok(())
    }

    fn observe_run(&self, started: Instant, result: &str) {
        let labels = [("result", result)];
        self.instruments.count("runner_runs_total", &labels);
        self.instruments.metrics().observe_histogram(
            "runner_duration_ms",
            &labels,
            started.elapsed().as_millis() as f64,
        );
    }
}

#[async_trait]
impl Handler for Runner {
    fn name(&self) -> &str {
        self.instruments.stage()
    }

    #[instrument(skip_all, name = "runner.handle", fields(submission_id = %message.submission().id))]
    async fn handle(&self, dispatch: &Dispatch<'_>, message: Message) -> Result<(), HandlerError> {
        let topic = message.topic();
        let Message::SubmissionCreated(submission) = message else {
            emit_message_ignored(self.instruments.stage(), topic.as_str());
            self.observe_run(Instant::now(), "ignored");
            return Ok(());
        };

        if dispatch.is_cancelled() {
            self.observe_run(Instant::now(), "cancelled");
            return Err(HandlerError::Cancelled);
        }

        self.run(dispatch, submission).await
    }
}
