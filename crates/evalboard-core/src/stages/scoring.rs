//! Scoring stage: keeps the score summary of every completed submission.

use async_trait::async_trait;
use evalboard_store::Store;
use tracing::{debug, instrument};

use crate::bus::{Dispatch, Handler, HandlerError, Message};
use crate::domain::ScoreSummary;
use crate::obs::{emit_message_ignored, Instrumentation};

pub struct Scoring {
    /// Keyed by submission id; a re-run replaces the previous summary.
    scores: Store<ScoreSummary>,
    instruments: Instrumentation,
}

impl Scoring {
    pub fn new(instruments: Instrumentation) -> Self {
        Self {
            scores: Store::new(),
            instruments,
        }
    }

    pub fn list(&self) -> Vec<ScoreSummary> {
        self.scores.list()
    }

    pub fn get(&self, submission_id: &str) -> Option<ScoreSummary> {
        self.scores.get(submission_id)
    }
}

#[async_trait]
impl Handler for Scoring {
    fn name(&self) -> &str {
        self.instruments.stage()
    }

    #[instrument(skip_all, name = "scoring.handle", fields(submission_id = %message.submission().id))]
    async fn handle(&self, _dispatch: &Dispatch<'_>, message: Message) -> Result<(), HandlerError> {
        let topic = message.topic();
        let Message::ScoreCalculated(submission) = message else {
            emit_message_ignored(self.instruments.stage(), topic.as_str());
            return Ok(());
        };
        let Some(summary) = submission.scored().cloned() else {
            debug!(status = %submission.status, "scoring: payload is not a completed score");
            return Ok(());
        };

        self.scores.save(submission.id, summary);
        self.instruments.count("scoring_scores_total", &[]);
        Ok(())
    }
}
