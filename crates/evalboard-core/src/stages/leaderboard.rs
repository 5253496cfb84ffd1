//! Leaderboard stage: ranked projection of scored submissions.
//!
//! Ranks are recomputed per benchmark on every update: score descending,
//! ties broken by submission id ascending, dense and 1-based within the
//! benchmark group.

use std::cmp::Ordering;

use async_trait::async_trait;
use evalboard_store::{Record, Store};
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::bus::{Dispatch, Handler, HandlerError, Message};
use crate::domain::{LeaderboardEntry, Submission};
use crate::obs::{emit_message_ignored, emit_ranks_recomputed, Instrumentation};

/// Ordering of entries inside one benchmark group.
pub fn rank_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.submission_id.cmp(&b.submission_id))
}

/// Ordering of the whole board: rank first, then benchmark, then submission.
fn board_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| a.benchmark_id.cmp(&b.benchmark_id))
        .then_with(|| a.submission_id.cmp(&b.submission_id))
}

pub struct Leaderboard {
    entries: Store<LeaderboardEntry>,
    /// Serializes upsert+rerank so concurrent updates and readers never see
    /// a half-rewritten benchmark group.
    ranking: Mutex<()>,
    instruments: Instrumentation,
}

impl Leaderboard {
    pub fn new(instruments: Instrumentation) -> Self {
        Self {
            entries: Store::new(),
            ranking: Mutex::new(()),
            instruments,
        }
    }

    /// Every entry, ordered by ascending rank.
    pub fn list(&self) -> Vec<LeaderboardEntry> {
        let mut all = {
            let _guard = self.ranking.lock();
            self.entries.list()
        };
        all.sort_by(board_order);
        all
    }

    /// Entries of one benchmark, best first.
    pub fn for_benchmark(&self, benchmark_id: &str) -> Vec<LeaderboardEntry> {
        let mut group: Vec<_> = self
            .list()
            .into_iter()
            .filter(|e| e.benchmark_id == benchmark_id)
            .collect();
        group.sort_by_key(|e| e.rank);
        group
    }

    /// Insert or replace the entry for a scored submission and rerank its
    /// benchmark group.
    pub fn upsert(&self, submission: &Submission, score: f64) {
        let entry = LeaderboardEntry {
            submission_id: submission.id.clone(),
            benchmark_id: submission.benchmark_id.clone(),
            agent_id: submission.agent_id.clone(),
            score,
            rank: 0,
        };

        let _guard = self.ranking.lock();
        self.entries.save(entry.record_key(), entry);
        let ranked = self.rerank(&submission.benchmark_id);
        emit_ranks_recomputed(&submission.benchmark_id, ranked);
    }

    /// Caller holds `ranking`.
    fn rerank(&self, benchmark_id: &str) -> usize {
        let mut group: Vec<_> = self
            .entries
            .list()
            .into_iter()
            .filter(|e| e.benchmark_id == benchmark_id)
            .collect();
        group.sort_by(rank_order);

        let ranked = group.len();
        for (i, mut entry) in group.into_iter().enumerate() {
            entry.rank = i + 1;
            self.entries.save(entry.record_key(), entry);
        }
        ranked
    }
}

#[async_trait]
impl Handler for Leaderboard {
    fn name(&self) -> &str {
        self.instruments.stage()
    }

    #[instrument(skip_all, name = "leaderboard.handle", fields(submission_id = %message.submission().id))]
    async fn handle(&self, _dispatch: &Dispatch<'_>, message: Message) -> Result<(), HandlerError> {
        let topic = message.topic();
        let Message::ScoreCalculated(submission) = message else {
            emit_message_ignored(self.instruments.stage(), topic.as_str());
            return Ok(());
        };
        let Some(score) = submission.scored().map(|s| s.score) else {
            debug!(status = %submission.status, "leaderboard: payload is not a completed score");
            return Ok(());
        };

        self.upsert(&submission, score);
        self.instruments.count("leaderboard_updates_total", &[]);
        Ok(())
    }
}
