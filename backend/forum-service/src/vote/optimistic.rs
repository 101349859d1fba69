//! Client-side optimistic vote reducer.
//!
//! The browser applies a vote locally before the server answers, using the
//! same transition table as the server. If the request fails it restores the
//! exact snapshot taken before the optimistic step; once it succeeds it can
//! adopt the `currentVote` and `score` the server reports for the target.

use super::{VoteDirection, VoteTransition};

/// Displayed vote state for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimisticVote {
    current: Option<VoteDirection>,
    score: i64,
}

/// State captured before an optimistic step, used to roll it back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "keep the snapshot to roll back if the request fails"]
pub struct Snapshot {
    current: Option<VoteDirection>,
    score: i64,
}

impl OptimisticVote {
    pub fn new(score: i64, current: Option<VoteDirection>) -> Self {
        Self { current, score }
    }

    pub fn current(&self) -> Option<VoteDirection> {
        self.current
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Apply `requested` locally and return the pre-step snapshot
    pub fn apply(&mut self, requested: VoteDirection) -> Snapshot {
        let snapshot = Snapshot {
            current: self.current,
            score: self.score,
        };

        let transition = VoteTransition::decide(self.current, requested);
        self.score += transition.score_delta();
        self.current = transition.resulting_state();

        snapshot
    }

    /// Undo an optimistic step after the server rejected it
    pub fn rollback(&mut self, snapshot: Snapshot) {
        self.current = snapshot.current;
        self.score = snapshot.score;
    }

    /// Adopt the server's view of the target after a successful request
    pub fn reconcile(&mut self, current: Option<VoteDirection>, score: i64) {
        self.current = current;
        self.score = score;
    }
}
