//! Ranked leaderboard projection.

use evalboard_store::Record;
use serde::{Deserialize, Serialize};

/// One scored submission on a benchmark's leaderboard.
///
/// `rank` is derived by the leaderboard stage and is rewritten on every
/// recompute of the entry's benchmark group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub submission_id: String,
    pub benchmark_id: String,
    pub agent_id: String,
    pub score: f64,
    pub rank: usize,
}

impl Record for LeaderboardEntry {
    fn record_key(&self) -> String {
        self.submission_id.clone()
    }
}
