//! A contest leaderboard held in a treap keyed by signup time.
//!
//! Participants are ordered by the time they signed up, so range scans over signup
//! times and bulk deletion of one signup time are cheap. Queries over the competitive
//! rank (best rank before a date, k-th best rank) scan the whole tree, as rank is
//! unrelated to the tree's key.
//!
//! Balance comes from random node priorities rather than rebalancing rules; see
//! [`treap`] for the underlying structure.

mod error;
pub mod records;
pub mod treap;

pub use crate::error::{LeaderboardError, RecordError};

use crate::treap::Treap;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BinaryHeap;

/// One contest participant
///
/// Lower `rank` is better. `id` is expected to be unique but this is not enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub id: i64,
    pub rank: i64,
    pub country: String,
    pub signup_time: i64,
}

impl Participant {
    pub fn new(
        name: impl Into<String>,
        id: i64,
        rank: i64,
        country: impl Into<String>,
        signup_time: i64,
    ) -> Self {
        Participant {
            name: name.into(),
            id,
            rank,
            country: country.into(),
            signup_time,
        }
    }
}

/// Builder for constructing [`Leaderboard`] instances
///
/// # Examples
///
/// ```
/// use ranktreap::Leaderboard;
///
/// // Priorities seeded from OS entropy
/// let board = Leaderboard::builder().build();
///
/// // Reproducible tree shapes
/// let board = Leaderboard::builder().seed(42).build();
/// assert!(board.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LeaderboardBuilder {
    seed: Option<u64>,
}

impl LeaderboardBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the priority generator
    ///
    /// Two leaderboards built with the same seed and fed the same inserts end up with
    /// identical tree shapes.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build an empty leaderboard
    pub fn build(self) -> Leaderboard {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Leaderboard {
            entries: Treap::new(),
            rng,
        }
    }
}

/// Participants ordered by signup time
///
/// The leaderboard owns its priority generator, so every insertion draws from the same
/// stream.
pub struct Leaderboard {
    entries: Treap<i64, Participant>,
    rng: StdRng,
}

impl Leaderboard {
    /// Create a new builder for constructing leaderboards
    pub fn builder() -> LeaderboardBuilder {
        LeaderboardBuilder::new()
    }

    /// An empty leaderboard with entropy-seeded priorities
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of participants, counted by walking the tree
    pub fn count_nodes(&self) -> usize {
        self.entries.count_nodes()
    }

    /// Add a participant
    ///
    /// Duplicate IDs and signup times are accepted; nothing is overwritten.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        id: i64,
        rank: i64,
        country: impl Into<String>,
        signup_time: i64,
    ) {
        self.insert_participant(Participant::new(name, id, rank, country, signup_time));
    }

    /// Add an already-built participant record
    pub fn insert_participant(&mut self, participant: Participant) {
        debug!(
            "inserting participant {} signed up at {}",
            participant.id, participant.signup_time
        );
        self.entries
            .insert(participant.signup_time, participant, &mut self.rng);
    }

    /// Remove the participant with `id`, returning whether one was found
    ///
    /// The tree is not keyed by ID, so this is a full scan. Should several participants
    /// share the ID, every one reached by the scan is removed.
    pub fn delete_by_id(&mut self, id: i64) -> bool {
        let removed = self.entries.remove_where(|_, p| p.id == id);
        if removed > 0 {
            info!("deleted participant {id}");
        } else {
            debug!("no participant with id {id}");
        }
        removed > 0
    }

    /// Remove every participant who signed up at exactly `date`, returning how many
    pub fn delete_by_signup_date(&mut self, date: i64) -> usize {
        let removed = self.entries.remove_key(&date);
        info!("deleted {removed} participants with signup time {date}");
        removed
    }

    /// `(id, signup_time)` of every participant with `t1 <= signup_time <= t2`, in
    /// signup order
    ///
    /// Participants sharing a signup time come out in no particular order relative to
    /// each other.
    pub fn range_ids(&self, t1: i64, t2: i64) -> Result<Vec<(i64, i64)>, LeaderboardError> {
        if t1 > t2 {
            return Err(LeaderboardError::InvertedRange { t1, t2 });
        }
        Ok(self
            .entries
            .range(&t1, &t2)
            .into_iter()
            .map(|(time, p)| (p.id, *time))
            .collect())
    }

    /// ID of the best-ranked participant who signed up strictly before `date`
    ///
    /// On equal ranks the first one met in a pre-order walk of the tree wins.
    pub fn best_rank_before_date(&self, date: i64) -> Option<i64> {
        let mut best: Option<(i64, i64)> = None;
        self.entries.for_each_preorder(|time, p| {
            if *time < date && best.map_or(true, |(rank, _)| p.rank < rank) {
                best = Some((p.rank, p.id));
            }
        });
        best.map(|(_, id)| id)
    }

    /// ID of the participant holding the `k`-th best (smallest) rank, `k` counting from 1
    ///
    /// Uses a max-heap of at most `k` `(rank, id)` pairs over one full scan, so equal
    /// ranks are ordered by ID. Returns `Ok(None)` if there are fewer than `k`
    /// participants.
    pub fn kth_best_rank(&self, k: usize) -> Result<Option<i64>, LeaderboardError> {
        if k == 0 {
            return Err(LeaderboardError::InvalidK(k));
        }
        let mut heap = BinaryHeap::with_capacity(k.min(self.len()) + 1);
        self.entries.for_each_preorder(|_, p| {
            heap.push((p.rank, p.id));
            if heap.len() > k {
                heap.pop();
            }
        });
        if heap.len() < k {
            return Ok(None);
        }
        Ok(heap.peek().map(|&(_, id)| id))
    }

    /// Iterate over the participants in signup order
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.entries.iter().map(|(_, p)| p)
    }
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<Participant> for Leaderboard {
    fn extend<I: IntoIterator<Item = Participant>>(&mut self, iter: I) {
        for participant in iter {
            self.insert_participant(participant);
        }
    }
}
