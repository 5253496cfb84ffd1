//! Orchestrator stage: entry point of the submission pipeline.

use std::sync::Arc;

use evalboard_store::{Record, Store};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::bus::{Bus, Message};
use crate::domain::validation::require;
use crate::domain::{BoardError, Result, Submission};
use crate::obs::{emit_submission_accepted, Instrumentation};

pub struct Orchestrator {
    submissions: Store<Submission>,
    bus: Arc<Bus>,
    instruments: Instrumentation,
}

impl Orchestrator {
    pub fn new(bus: Arc<Bus>, instruments: Instrumentation) -> Self {
        Self {
            submissions: Store::new(),
            bus,
            instruments,
        }
    }

    /// Accept a submission and drive it through the pipeline.
    ///
    /// The submission is persisted as `submitted` and published as
    /// `submission.created`; every downstream stage has run by the time this
    /// returns. Invalid input is rejected before anything is stored. When the
    /// downstream chain fails, [`BoardError::Dispatch`] carries the stored
    /// submission together with the aggregated failures.
    #[instrument(skip(self, cancel, payload), fields(stage = self.instruments.stage()))]
    pub async fn submit(
        &self,
        cancel: &CancellationToken,
        agent_id: &str,
        benchmark_id: &str,
        payload: &str,
    ) -> Result<Submission> {
        if let Err(e) =
            require("agent_id", agent_id).and_then(|()| require("benchmark_id", benchmark_id))
        {
            self.instruments
                .count("orchestrator_submissions_total", &[("result", "invalid")]);
            return Err(e.into());
        }

        let submission = Submission::new(
            agent_id.to_string(),
            benchmark_id.to_string(),
            payload.to_string(),
        );
        self.submissions
            .save(submission.record_key(), submission.clone());
        emit_submission_accepted(&submission.id, agent_id, benchmark_id);

        let published = self
            .bus
            .publish(cancel, Message::SubmissionCreated(submission.clone()))
            .await;

        match published {
            Ok(()) => {
                self.instruments
                    .count("orchestrator_submissions_total", &[("result", "ok")]);
                Ok(submission)
            }
            Err(source) => {
                warn!(submission_id = %submission.id, error = %source, "orchestrator: dispatch failed");
                self.instruments
                    .count("orchestrator_submissions_total", &[("result", "error")]);
                Err(BoardError::Dispatch {
                    submission: Box::new(submission),
                    source,
                })
            }
        }
    }

    /// Snapshot of every accepted submission, as it was when accepted.
    pub fn list(&self) -> Vec<Submission> {
        self.submissions.list()
    }

    pub fn get(&self, submission_id: &str) -> Option<Submission> {
        self.submissions.get(submission_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Dispatch, Handler, HandlerError, Topic};
    use crate::domain::{SubmissionStatus, ValidationError};
    use crate::metrics::InMemoryMetrics;
    use async_trait::async_trait;

    struct Failing;

    #[async_trait]
    impl Handler for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn handle(&self, _: &Dispatch<'_>, _: Message) -> std::result::Result<(), HandlerError> {
            Err(HandlerError::Failed("boom".to_string()))
        }
    }

    fn orchestrator() -> (Orchestrator, Arc<Bus>, Arc<InMemoryMetrics>) {
        let metrics = Arc::new(InMemoryMetrics::new());
        let instruments = Instrumentation::new("bus", metrics.clone());
        let bus = Arc::new(Bus::new(instruments.clone()));
        (
            Orchestrator::new(bus.clone(), instruments.for_stage("orchestrator")),
            bus,
            metrics,
        )
    }

    #[tokio::test]
    async fn submit_persists_submitted_record() {
        let (orch, _, metrics) = orchestrator();
        let cancel = CancellationToken::new();

        let s = orch.submit(&cancel, "a1", "b1", "x").await.unwrap();

        assert_eq!(s.status, SubmissionStatus::Submitted);
        assert_eq!(orch.get(&s.id), Some(s.clone()));
        assert_eq!(orch.list(), vec![s]);
        assert_eq!(
            metrics.counter("orchestrator_submissions_total", &[("result", "ok")]),
            1.0
        );
    }

    #[tokio::test]
    async fn empty_ids_are_rejected_without_side_effects() {
        let (orch, _, _) = orchestrator();
        let cancel = CancellationToken::new();

        let err = orch.submit(&cancel, "", "b1", "x").await.unwrap_err();
        assert!(matches!(
            err,
            BoardError::Validation(ValidationError::EmptyField { field: "agent_id" })
        ));
        let err = orch.submit(&cancel, "a1", "  ", "x").await.unwrap_err();
        assert!(matches!(
            err,
            BoardError::Validation(ValidationError::EmptyField {
                field: "benchmark_id"
            })
        ));
        assert!(orch.list().is_empty());
    }

    #[tokio::test]
    async fn dispatch_failure_keeps_the_stored_submission() {
        let (orch, bus, _) = orchestrator();
        bus.subscribe(Topic::SubmissionCreated, Arc::new(Failing));
        let cancel = CancellationToken::new();

        let err = orch.submit(&cancel, "a1", "b1", "x").await.unwrap_err();
        let BoardError::Dispatch { submission, source } = err else {
            panic!("expected dispatch error");
        };
        assert_eq!(source.failed_handlers(), vec!["failing"]);
        assert_eq!(orch.get(&submission.id).as_ref(), Some(submission.as_ref()));
    }
}
