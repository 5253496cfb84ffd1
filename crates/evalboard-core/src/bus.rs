//! In-process, topic-keyed publish/subscribe bus.
//!
//! Stages register [`Handler`]s per [`Topic`] and publish [`Message`]s. A
//! `publish` call runs every handler of the message's topic, in registration
//! order, on the caller's own task, and only resolves once all of them (and
//! anything they publish in turn through their [`Dispatch`]) have finished.
//! One `submit` therefore drives the whole chain before it returns.
//!
//! # Usage
//!
//! ```rust,ignore
//! let bus = Arc::new(Bus::new(instruments));
//! bus.subscribe(Topic::SubmissionCreated, runner.clone());
//! bus.publish(&cancel, Message::SubmissionCreated(submission)).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::domain::Submission;
use crate::obs::{emit_handler_failed, Instrumentation};

/// Named channel identifying a class of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    /// A submission was persisted by the orchestrator.
    SubmissionCreated,
    /// The runner completed a submission and attached its score.
    ScoreCalculated,
}

impl Topic {
    pub const fn as_str(self) -> &'static str {
        match self {
            Topic::SubmissionCreated => "submission.created",
            Topic::ScoreCalculated => "score.calculated",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event on the bus. The topic is implied by the variant, so a payload can
/// never be published under the wrong topic.
///
/// Payloads are owned snapshots; every handler receives its own clone.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    SubmissionCreated(Submission),
    ScoreCalculated(Submission),
}

impl Message {
    pub fn topic(&self) -> Topic {
        match self {
            Message::SubmissionCreated(_) => Topic::SubmissionCreated,
            Message::ScoreCalculated(_) => Topic::ScoreCalculated,
        }
    }

    pub fn submission(&self) -> &Submission {
        match self {
            Message::SubmissionCreated(s) | Message::ScoreCalculated(s) => s,
        }
    }
}

/// Failure reported by a single handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("dispatch cancelled")]
    Cancelled,

    /// Work was done but publishing to the next stage failed.
    #[error("downstream publish failed: {0}")]
    Downstream(Box<PublishError>),

    #[error("{0}")]
    Failed(String),
}

impl From<PublishError> for HandlerError {
    fn from(err: PublishError) -> Self {
        HandlerError::Downstream(Box::new(err))
    }
}

/// One handler's failure inside a publish.
#[derive(Debug, thiserror::Error)]
#[error("{handler}: {error}")]
pub struct HandlerFailure {
    pub handler: String,
    #[source]
    pub error: HandlerError,
}

/// Aggregated failures of every handler that failed during one publish.
///
/// Handlers after a failing one still ran; `failures` lists only those that
/// returned an error, in invocation order.
#[derive(Debug)]
pub struct PublishError {
    pub topic: Topic,
    pub failures: Vec<HandlerFailure>,
}

impl PublishError {
    /// Names of the handlers that failed.
    pub fn failed_handlers(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.handler.as_str()).collect()
    }
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} handler(s) failed on {}: ",
            self.failures.len(),
            self.topic
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}

/// A subscriber invoked synchronously on publish.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Identity used in logs, metrics and aggregated errors.
    fn name(&self) -> &str;

    /// Process one message. Republish through `dispatch` to chain stages.
    async fn handle(&self, dispatch: &Dispatch<'_>, message: Message) -> Result<(), HandlerError>;
}

/// Handle passed to every handler invocation: the bus to republish on and the
/// cancellation token of the originating call.
#[derive(Clone, Copy)]
pub struct Dispatch<'a> {
    bus: &'a Bus,
    cancel: &'a CancellationToken,
}

impl Dispatch<'_> {
    /// Publish on the same bus, within the same cancellation scope.
    pub async fn publish(&self, message: Message) -> Result<(), PublishError> {
        self.bus.publish(self.cancel, message).await
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

type HandlerList = Vec<Arc<dyn Handler>>;

/// Topic-keyed broker.
///
/// The registry is guarded by one lock. `publish` snapshots the handler list
/// and releases the lock before invoking anything, so handlers may publish
/// or subscribe reentrantly.
pub struct Bus {
    handlers: RwLock<HashMap<Topic, HandlerList>>,
    instruments: Instrumentation,
}

impl Bus {
    pub fn new(instruments: Instrumentation) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            instruments,
        }
    }

    /// Register `handler` under `topic`, after any existing handlers.
    pub fn subscribe(&self, topic: Topic, handler: Arc<dyn Handler>) {
        debug!(topic = %topic, handler = %handler.name(), "bus: subscribed");
        self.handlers.write().entry(topic).or_default().push(handler);
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers.read().get(&topic).map_or(0, Vec::len)
    }

    /// A dispatch handle for invoking handlers directly (outside `publish`).
    pub fn dispatch<'a>(&'a self, cancel: &'a CancellationToken) -> Dispatch<'a> {
        Dispatch { bus: self, cancel }
    }

    /// Deliver `message` to every handler of its topic.
    ///
    /// With no subscribers this is a successful no-op. Otherwise every
    /// handler runs regardless of earlier failures and the failures are
    /// returned together.
    #[instrument(skip_all, name = "bus.publish", fields(topic = %message.topic()))]
    pub async fn publish(
        &self,
        cancel: &CancellationToken,
        message: Message,
    ) -> Result<(), PublishError> {
        let topic = message.topic();
        let handlers: HandlerList = self
            .handlers
            .read()
            .get(&topic)
            .cloned()
            .unwrap_or_default();

        if handlers.is_empty() {
            debug!("bus: no subscribers");
            return Ok(());
        }

        self.instruments
            .count("bus_messages_total", &[("topic", topic.as_str())]);

        let dispatch = self.dispatch(cancel);
        let mut failures = Vec::new();
        for handler in &handlers {
            if let Err(error) = handler.handle(&dispatch, message.clone()).await {
                emit_handler_failed(topic.as_str(), handler.name(), &error);
                self.instruments.count(
                    "bus_handler_failures_total",
                    &[("topic", topic.as_str()), ("handler", handler.name())],
                );
                failures.push(HandlerFailure {
                    handler: handler.name().to_string(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PublishError { topic, failures })
        }
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        let mut registry: Vec<(Topic, Vec<&str>)> = handlers
            .iter()
            .map(|(topic, list)| (*topic, list.iter().map(|h| h.name()).collect()))
            .collect();
        registry.sort_by_key(|(topic, _)| *topic);
        f.debug_struct("Bus")
            .field("handlers", &registry)
            .field("stage", &self.instruments.stage())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::InMemoryMetrics;
    use parking_lot::Mutex;

    /// Appends `name` to a shared log, then fails if asked to.
    struct Probe {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait]
    impl Handler for Probe {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, _: &Dispatch<'_>, _: Message) -> Result<(), HandlerError> {
            self.log.lock().push(self.name);
            if self.fail {
                Err(HandlerError::Failed(format!("{} exploded", self.name)))
            } else {
                Ok(())
            }
        }
    }

    fn bus() -> (Bus, Arc<InMemoryMetrics>) {
        let metrics = Arc::new(InMemoryMetrics::new());
        (Bus::new(Instrumentation::new("bus", metrics.clone())), metrics)
    }

    fn created() -> Message {
        Message::SubmissionCreated(Submission::new("a".into(), "b".into(), "p".into()))
    }

    #[test]
    fn topic_names() {
        assert_eq!(Topic::SubmissionCreated.as_str(), "submission.created");
        assert_eq!(Topic::ScoreCalculated.to_string(), "score.calculated");
        assert_eq!(created().topic(), Topic::SubmissionCreated);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let (bus, metrics) = bus();
        let cancel = CancellationToken::new();
        bus.publish(&cancel, created()).await.unwrap();
        assert_eq!(
            metrics.counter("bus_messages_total", &[("topic", "submission.created")]),
            0.0
        );
    }

    #[tokio::test]
    async fn handlers_run_in_registration_order_past_failures() {
        let (bus, metrics) = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        for (name, fail) in [("first", false), ("second", true), ("third", false)] {
            bus.subscribe(
                Topic::SubmissionCreated,
                Arc::new(Probe {
                    name,
                    log: log.clone(),
                    fail,
                }),
            );
        }

        let cancel = CancellationToken::new();
        let err = bus.publish(&cancel, created()).await.unwrap_err();

        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
        assert_eq!(err.topic, Topic::SubmissionCreated);
        assert_eq!(err.failed_handlers(), vec!["second"]);
        assert!(err.to_string().contains("second exploded"));
        assert_eq!(
            metrics.counter(
                "bus_handler_failures_total",
                &[("topic", "submission.created"), ("handler", "second")]
            ),
            1.0
        );
    }

    #[tokio::test]
    async fn every_failure_is_aggregated() {
        let (bus, _) = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b"] {
            bus.subscribe(
                Topic::ScoreCalculated,
                Arc::new(Probe {
                    name,
                    log: log.clone(),
                    fail: true,
                }),
            );
        }
        let cancel = CancellationToken::new();
        let msg = Message::ScoreCalculated(Submission::new("a".into(), "b".into(), "p".into()));
        let err = bus.publish(&cancel, msg).await.unwrap_err();
        assert_eq!(err.failed_handlers(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn routing_is_by_topic() {
        let (bus, _) = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(
            Topic::ScoreCalculated,
            Arc::new(Probe {
                name: "scores",
                log: log.clone(),
                fail: false,
            }),
        );
        let cancel = CancellationToken::new();
        bus.publish(&cancel, created()).await.unwrap();
        assert!(log.lock().is_empty());
        assert_eq!(bus.subscriber_count(Topic::ScoreCalculated), 1);
        assert_eq!(bus.subscriber_count(Topic::SubmissionCreated), 0);
    }

    /// Republishes every `submission.created` as `score.calculated`.
    struct Relay;

    #[async_trait]
    impl Handler for Relay {
        fn name(&self) -> &str {
            "relay"
        }

        async fn handle(&self, dispatch: &Dispatch<'_>, message: Message) -> Result<(), HandlerError> {
            if let Message::SubmissionCreated(s) = message {
                dispatch.publish(Message::ScoreCalculated(s)).await?;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn reentrant_publish_completes_before_outer_returns() {
        let (bus, _) = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Topic::SubmissionCreated, Arc::new(Relay));
        bus.subscribe(
            Topic::ScoreCalculated,
            Arc::new(Probe {
                name: "downstream",
                log: log.clone(),
                fail: false,
            }),
        );

        let cancel = CancellationToken::new();
        bus.publish(&cancel, created()).await.unwrap();
        assert_eq!(*log.lock(), vec!["downstream"]);
    }

    #[tokio::test]
    async fn nested_failure_surfaces_through_outer_publish() {
        let (bus, _) = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Topic::SubmissionCreated, Arc::new(Relay));
        bus.subscribe(
            Topic::ScoreCalculated,
            Arc::new(Probe {
                name: "broken",
                log,
                fail: true,
            }),
        );

        let cancel = CancellationToken::new();
        let err = bus.publish(&cancel, created()).await.unwrap_err();
        assert_eq!(err.failed_handlers(), vec!["relay"]);
        match &err.failures[0].error {
            HandlerError::Downstream(inner) => {
                assert_eq!(inner.topic, Topic::ScoreCalculated);
                assert_eq!(inner.failed_handlers(), vec!["broken"]);
            }
            other => panic!("expected downstream failure, got {other:?}"),
        }
    }

    #[test]
    fn debug_lists_handler_names() {
        let (bus, _) = bus();
        bus.subscribe(Topic::SubmissionCreated, Arc::new(Relay));
        let rendered = format!("{bus:?}");
        assert!(rendered.contains("relay"));
    }
}
