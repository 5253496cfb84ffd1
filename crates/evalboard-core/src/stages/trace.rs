//! Trace stage: append-only log of events about submissions.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use evalboard_store::Store;
use tracing::instrument;

use crate::bus::{Dispatch, Handler, HandlerError, Message};
use crate::domain::validation::require;
use crate::domain::{Result, TraceEvent, TraceLevel};
use crate::obs::{emit_message_ignored, Instrumentation};

pub struct Traces {
    /// Keyed by a zero-padded append sequence so snapshots list oldest first.
    events: Store<TraceEvent>,
    seq: AtomicU64,
    instruments: Instrumentation,
}

impl Traces {
    pub fn new(instruments: Instrumentation) -> Self {
        Self {
            events: Store::new(),
            seq: AtomicU64::new(0),
            instruments,
        }
    }

    /// Append a trace event written directly by a caller.
    pub fn record(&self, submission_id: &str, message: &str, level: TraceLevel) -> Result<TraceEvent> {
        require("submission_id", submission_id)?;
        require("message", message)?;

        let event = TraceEvent::new(submission_id.to_string(), message.to_string(), level);
        self.append(event.clone());
        Ok(event)
    }

    /// Every event, in append order.
    pub fn list(&self) -> Vec<TraceEvent> {
        self.events.list()
    }

    /// Events for one submission, in append order.
    pub fn for_submission(&self, submission_id: &str) -> Vec<TraceEvent> {
        self.list()
            .into_iter()
            .filter(|e| e.submission_id == submission_id)
            .collect()
    }

    fn append(&self, event: TraceEvent) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let level = event.level.as_str();
        self.events.save(format!("{seq:020}"), event);
        self.instruments.count("trace_events_total", &[("level", level)]);
    }
}

#[async_trait]
impl Handler for Traces {
    fn name(&self) -> &str {
        self.instruments.stage()
    }

    #[instrument(skip_all, name = "trace.handle", fields(submission_id = %message.submission().id))]
    async fn handle(&self, _dispatch: &Dispatch<'_>, message: Message) -> std::result::Result<(), HandlerError> {
        let topic = message.topic();
        let Message::ScoreCalculated(submission) = message else {
            emit_message_ignored(self.instruments.stage(), topic.as_str());
            return Ok(());
        };

        let text = match &submission.score_summary {
            Some(summary) => format!(
                "submission {} {} with score {:.3}",
                submission.id, submission.status, summary.score
            ),
            None => format!("submission {} {}", submission.id, submission.status),
        };
        self.append(TraceEvent::new(submission.id, text, TraceLevel::Info));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use crate::domain::{BoardError, ScoreSummary, Submission, ValidationError};
    use crate::metrics::InMemoryMetrics;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn traces() -> (Traces, Arc<InMemoryMetrics>) {
        let metrics = Arc::new(InMemoryMetrics::new());
        (
            Traces::new(Instrumentation::new("trace", metrics.clone())),
            metrics,
        )
    }

    #[test]
    fn record_validates_input() {
        let (traces, _) = traces();
        let err = traces.record("", "hello", TraceLevel::Info).unwrap_err();
        assert!(matches!(
            err,
            BoardError::Validation(ValidationError::EmptyField {
                field: "submission_id"
            })
        ));
        let err = traces.record("s1", " ", TraceLevel::Info).unwrap_err();
        assert!(matches!(
            err,
            BoardError::Validation(ValidationError::EmptyField { field: "message" })
        ));
        assert!(traces.list().is_empty());
    }

    #[test]
    fn record_appends_and_filters_by_submission() {
        let (traces, metrics) = traces();
        traces.record("s1", "started", TraceLevel::Debug).unwrap();
        traces.record("s2", "other", TraceLevel::Warn).unwrap();
        traces.record("s1", "finished", TraceLevel::Info).unwrap();

        let s1: Vec<_> = traces
            .for_submission("s1")
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(s1, vec!["started", "finished"]);
        assert_eq!(traces.list().len(), 3);
        assert_eq!(metrics.counter("trace_events_total", &[("level", "warn")]), 1.0);
    }

    #[tokio::test]
    async fn score_calculated_appends_info_event() {
        let (traces, _) = traces();
        let bus = Bus::new(Instrumentation::new("bus", Arc::new(InMemoryMetrics::new())));
        let cancel = CancellationToken::new();
        let s = Submission::new("a1".into(), "b1".into(), "x".into())
            .start()
            .complete(ScoreSummary::new(1.0, BTreeMap::new()), Utc::now());

        traces
            .handle(&bus.dispatch(&cancel), Message::ScoreCalculated(s.clone()))
            .await
            .unwrap();

        let events = traces.for_submission(&s.id);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, TraceLevel::Info);
        assert!(events[0].message.contains("completed with score 1.000"));
    }
}
