//! Vote engine.
//!
//! Each (voter, target) pair is in one of three states: no vote, `UP`, or
//! `DOWN`. Applying a direction moves between them:
//!
//! | current | requested | transition            | result |
//! |---------|-----------|-----------------------|--------|
//! | none    | d         | create record `d`     | d      |
//! | d       | d         | delete record         | none   |
//! | d       | !d        | update record to `!d` | !d     |
//!
//! The same table drives the server (via [`VoteService`] over a
//! [`VoteStore`]) and the browser-side optimistic reducer in [`optimistic`].
//! A target's score is always `count(UP) - count(DOWN)`.

pub mod optimistic;
pub mod store;

pub use optimistic::{OptimisticVote, Snapshot};
pub use store::PgVoteStore;

use crate::error::{AppError, Result};
use crate::metrics::VOTES_TOTAL;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Polarity of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vote_direction", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Contribution of one vote in this direction to a score
    pub fn weight(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// What has to happen to the stored record to honour a vote request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// No record yet: insert one
    Create(VoteDirection),
    /// Same direction re-applied: delete the record holding this direction
    Remove(VoteDirection),
    /// Opposite direction applied: flip the record in place
    Switch {
        from: VoteDirection,
        to: VoteDirection,
    },
}

impl VoteTransition {
    pub fn decide(current: Option<VoteDirection>, requested: VoteDirection) -> Self {
        match current {
            None => VoteTransition::Create(requested),
            Some(existing) if existing == requested => VoteTransition::Remove(existing),
            Some(existing) => VoteTransition::Switch {
                from: existing,
                to: requested,
            },
        }
    }

    /// State of the (voter, target) pair once the transition is applied
    pub fn resulting_state(self) -> Option<VoteDirection> {
        match self {
            VoteTransition::Create(direction) => Some(direction),
            VoteTransition::Remove(_) => None,
            VoteTransition::Switch { to, .. } => Some(to),
        }
    }

    /// Change in the target's score caused by the transition
    pub fn score_delta(self) -> i64 {
        match self {
            VoteTransition::Create(direction) => direction.weight(),
            VoteTransition::Remove(direction) => -direction.weight(),
            VoteTransition::Switch { from, to } => to.weight() - from.weight(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VoteTransition::Create(_) => "create",
            VoteTransition::Remove(_) => "remove",
            VoteTransition::Switch { .. } => "switch",
        }
    }
}

/// Something that can be voted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl VoteTarget {
    pub fn id(self) -> Uuid {
        match self {
            VoteTarget::Post(id) | VoteTarget::Comment(id) => id,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            VoteTarget::Post(_) => "post",
            VoteTarget::Comment(_) => "comment",
        }
    }
}

/// Up/down counts for one target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub up: i64,
    pub down: i64,
}

impl Tally {
    pub fn from_directions<I>(directions: I) -> Self
    where
        I: IntoIterator<Item = VoteDirection>,
    {
        directions
            .into_iter()
            .fold(Tally::default(), |mut tally, direction| {
                match direction {
                    VoteDirection::Up => tally.up += 1,
                    VoteDirection::Down => tally.down += 1,
                }
                tally
            })
    }

    pub fn score(&self) -> i64 {
        self.up - self.down
    }
}

/// Persistence seam for votes on posts and comments.
///
/// `apply` must behave as compare-and-set against the state the transition
/// was decided from: a record that appeared or vanished concurrently yields
/// [`AppError::Conflict`] and leaves the store untouched.
#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn target_exists(&self, target: VoteTarget) -> Result<bool>;

    async fn current_vote(&self, voter_id: Uuid, target: VoteTarget)
        -> Result<Option<VoteDirection>>;

    async fn apply(
        &self,
        voter_id: Uuid,
        target: VoteTarget,
        transition: VoteTransition,
    ) -> Result<()>;

    async fn tally(&self, target: VoteTarget) -> Result<Tally>;
}

/// Result of a vote request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub transition: VoteTransition,
    pub state: Option<VoteDirection>,
    pub tally: Tally,
}

/// Server-authoritative side of the vote engine
pub struct VoteService<S> {
    store: S,
}

impl<S: VoteStore> VoteService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Apply `requested` on behalf of `voter_id`
    pub async fn cast(
        &self,
        voter_id: Uuid,
        target: VoteTarget,
        requested: VoteDirection,
    ) -> Result<VoteOutcome> {
        if !self.store.target_exists(target).await? {
            return Err(AppError::NotFound(format!(
                "{} {} does not exist",
                target.kind(),
                target.id()
            )));
        }

        let current = self.store.current_vote(voter_id, target).await?;
        let transition = VoteTransition::decide(current, requested);
        self.store.apply(voter_id, target, transition).await?;

        VOTES_TOTAL
            .with_label_values(&[target.kind(), transition.label()])
            .inc();

        let tally = self.store.tally(target).await?;

        tracing::info!(
            voter_id = %voter_id,
            target = target.kind(),
            target_id = %target.id(),
            transition = transition.label(),
            score = tally.score(),
            "vote applied"
        );

        Ok(VoteOutcome {
            transition,
            state: transition.resulting_state(),
            tally,
        })
    }

    pub async fn tally(&self, target: VoteTarget) -> Result<Tally> {
        self.store.tally(target).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use VoteDirection::{Down, Up};

    /// In-memory store with the same compare-and-set contract as Postgres
    #[derive(Default)]
    pub(crate) struct MemoryVoteStore {
        targets: Mutex<HashSet<VoteTarget>>,
        votes: Mutex<HashMap<(Uuid, VoteTarget), VoteDirection>>,
        fail_writes: Mutex<bool>,
    }

    impl MemoryVoteStore {
        pub(crate) fn with_targets(targets: &[VoteTarget]) -> Self {
            let store = Self::default();
            store.targets.lock().unwrap().extend(targets.iter().copied());
            store
        }

        pub(crate) fn fail_writes(&self, fail: bool) {
            *self.fail_writes.lock().unwrap() = fail;
        }

        fn records_for(&self, target: VoteTarget) -> Vec<VoteDirection> {
            self.votes
                .lock()
                .unwrap()
                .iter()
                .filter(|((_, t), _)| *t == target)
                .map(|(_, direction)| *direction)
                .collect()
        }
    }

    #[async_trait]
    impl VoteStore for MemoryVoteStore {
        async fn target_exists(&self, target: VoteTarget) -> Result<bool> {
            Ok(self.targets.lock().unwrap().contains(&target))
        }

        async fn current_vote(
            &self,
            voter_id: Uuid,
            target: VoteTarget,
        ) -> Result<Option<VoteDirection>> {
            Ok(self.votes.lock().unwrap().get(&(voter_id, target)).copied())
        }

        async fn apply(
            &self,
            voter_id: Uuid,
            target: VoteTarget,
            transition: VoteTransition,
        ) -> Result<()> {
            if *self.fail_writes.lock().unwrap() {
                return Err(AppError::Database("connection reset".into()));
            }

            let mut votes = self.votes.lock().unwrap();
            let key = (voter_id, target);
            match (transition, votes.get(&key).copied()) {
                (VoteTransition::Create(direction), None) => {
                    votes.insert(key, direction);
                }
                (VoteTransition::Remove(direction), Some(existing)) if existing == direction => {
                    votes.remove(&key);
                }
                (VoteTransition::Switch { from, to }, Some(existing)) if existing == from => {
                    votes.insert(key, to);
                }
                _ => return Err(AppError::Conflict("vote changed concurrently".into())),
            }
            Ok(())
        }

        async fn tally(&self, target: VoteTarget) -> Result<Tally> {
            Ok(Tally::from_directions(self.records_for(target)))
        }
    }

    #[test]
    fn transition_table() {
        assert_eq!(VoteTransition::decide(None, Up), VoteTransition::Create(Up));
        assert_eq!(VoteTransition::decide(None, Down), VoteTransition::Create(Down));
        assert_eq!(VoteTransition::decide(Some(Up), Up), VoteTransition::Remove(Up));
        assert_eq!(VoteTransition::decide(Some(Down), Down), VoteTransition::Remove(Down));
        assert_eq!(
            VoteTransition::decide(Some(Up), Down),
            VoteTransition::Switch { from: Up, to: Down }
        );
        assert_eq!(
            VoteTransition::decide(Some(Down), Up),
            VoteTransition::Switch { from: Down, to: Up }
        );
    }

    #[test]
    fn score_deltas_agree_with_tallies() {
        let states = [None, Some(Up), Some(Down)];
        let others = [Up, Up, Down];

        for current in states {
            for requested in [Up, Down] {
                let transition = VoteTransition::decide(current, requested);

                let before = Tally::from_directions(others.iter().copied().chain(current));
                let after = Tally::from_directions(
                    others.iter().copied().chain(transition.resulting_state()),
                );

                assert_eq!(
                    after.score() - before.score(),
                    transition.score_delta(),
                    "{:?} + {:?}",
                    current,
                    requested
                );
            }
        }
    }

    #[test]
    fn reapplying_returns_to_none() {
        for direction in [Up, Down] {
            let first = VoteTransition::decide(None, direction);
            let second = VoteTransition::decide(first.resulting_state(), direction);
            assert_eq!(second.resulting_state(), None);
        }
    }

    #[test]
    fn direction_wire_format() {
        assert_eq!(serde_json::to_string(&Up).unwrap(), "\"UP\"");
        assert_eq!(serde_json::from_str::<VoteDirection>("\"DOWN\"").unwrap(), Down);
        assert!(serde_json::from_str::<VoteDirection>("\"SIDEWAYS\"").is_err());
    }

    #[tokio::test]
    async fn toggle_off_through_service() {
        let post = VoteTarget::Post(Uuid::new_v4());
        let service = VoteService::new(MemoryVoteStore::with_targets(&[post]));
        let voter = Uuid::new_v4();

        let first = service.cast(voter, post, Up).await.unwrap();
        assert_eq!(first.state, Some(Up));
        assert_eq!(first.tally.score(), 1);

        let second = service.cast(voter, post, Up).await.unwrap();
        assert_eq!(second.transition, VoteTransition::Remove(Up));
        assert_eq!(second.state, None);
        assert_eq!(second.tally, Tally::default());
    }

    #[tokio::test]
    async fn score_is_up_minus_down() {
        let comment = VoteTarget::Comment(Uuid::new_v4());
        let service = VoteService::new(MemoryVoteStore::with_targets(&[comment]));
        let voters: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();

        let script = [
            (0, Up),
            (1, Up),
            (2, Down),
            (3, Up),
            (1, Down),
            (0, Up),
            (4, Down),
            (2, Down),
            (3, Down),
            (4, Up),
        ];

        for (voter, direction) in script {
            let outcome = service.cast(voters[voter], comment, direction).await.unwrap();
            let records = service.store.records_for(comment);
            let up = records.iter().filter(|d| **d == Up).count() as i64;
            let down = records.iter().filter(|d| **d == Down).count() as i64;
            assert_eq!(outcome.tally.score(), up - down);
        }

        // voter 1: DOWN, voter 3: DOWN, voter 4: UP
        assert_eq!(service.tally(comment).await.unwrap(), Tally { up: 1, down: 2 });
    }

    #[tokio::test]
    async fn unknown_target_is_rejected_without_writes() {
        let store = MemoryVoteStore::default();
        let service = VoteService::new(store);
        let missing = VoteTarget::Post(Uuid::new_v4());

        let err = service.cast(Uuid::new_v4(), missing, Up).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(service.store.records_for(missing).is_empty());
    }

    #[tokio::test]
    async fn failed_write_leaves_state_unchanged() {
        let post = VoteTarget::Post(Uuid::new_v4());
        let service = VoteService::new(MemoryVoteStore::with_targets(&[post]));
        let voter = Uuid::new_v4();

        service.cast(voter, post, Down).await.unwrap();
        service.store.fail_writes(true);

        assert!(service.cast(voter, post, Up).await.is_err());
        assert_eq!(service.store.current_vote(voter, post).await.unwrap(), Some(Down));
        assert_eq!(service.tally(post).await.unwrap().score(), -1);
    }

    #[tokio::test]
    async fn stale_transition_conflicts() {
        let post = VoteTarget::Post(Uuid::new_v4());
        let store = MemoryVoteStore::with_targets(&[post]);
        let voter = Uuid::new_v4();

        store.apply(voter, post, VoteTransition::Create(Up)).await.unwrap();
        // a second request decided from the old "no vote" state
        let err = store
            .apply(voter, post, VoteTransition::Create(Up))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.tally(post).await.unwrap().up, 1);
    }
}
