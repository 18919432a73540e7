//! The queue of incoming piece types.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::{debug, instrument, trace};

use crate::{GameRules, NextTypePolicy, PieceType};

/// Weighted random choice among piece types.
///
/// Entries with a weight of zero or less are never added.
#[derive(Debug, Clone, Default)]
pub struct WeightedPicker {
    entries: Vec<(PieceType, f64)>,
    total: f64,
}

impl WeightedPicker {
    /// Adds `kind` with `weight` if the weight is strictly positive.
    pub fn add(&mut self, kind: PieceType, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        self.entries.push((kind, weight));
        self.total += weight;
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing can be picked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Picks an entry with probability proportional to its weight.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PieceType> {
        let target = rng.random::<f64>() * self.total;
        let mut sum = 0.0;
        for (kind, weight) in &self.entries {
            sum += weight;
            if sum >= target {
                return Some(*kind);
            }
        }
        self.entries.last().map(|(kind, _)| *kind)
    }
}

#[derive(Debug, Clone)]
enum Source {
    Deterministic {
        types: Vec<PieceType>,
        cursor: usize,
    },
    Random {
        picker: WeightedPicker,
        rng: StdRng,
    },
    RemovedType,
}

impl Source {
    fn lookahead_size(&self) -> usize {
        match self {
            Source::Deterministic { types, .. } => types.len(),
            Source::Random { picker, .. } => picker.len(),
            Source::RemovedType => 0,
        }
    }

    fn produce(&mut self) -> Option<PieceType> {
        match self {
            Source::Deterministic { types, cursor } => {
                let kind = types.get(*cursor).copied();
                *cursor = (*cursor + 1) % types.len().max(1);
                kind
            }
            Source::Random { picker, rng } => picker.pick(rng),
            Source::RemovedType => None,
        }
    }
}

/// Upcoming piece types with lookahead and undo.
///
/// The policy comes from [`GameRules::next_type_policy`]:
/// deterministic cycling, weighted random, or no queue at all (the removed
/// piece's type is reused).
#[derive(Debug, Clone)]
pub struct IncomingQueue {
    source: Source,
    lookahead: VecDeque<PieceType>,
    history: Vec<PieceType>,
}

impl IncomingQueue {
    /// Queue for `rules` and palette `types`. Random queues are seeded from
    /// the operating system.
    #[instrument(skip(rules, types), fields(policy = %rules.next_type_policy, types = types.len()))]
    pub fn new(rules: &GameRules, types: &[PieceType]) -> Self {
        match rules.next_type_policy {
            NextTypePolicy::Deterministic => Self::deterministic(types),
            NextTypePolicy::Random => Self::random(rules, types, StdRng::from_os_rng()),
            NextTypePolicy::RemovedType => Self::removed_type(),
        }
    }

    /// Like [`IncomingQueue::new`], with a fixed seed for random queues.
    pub fn with_seed(rules: &GameRules, types: &[PieceType], seed: u64) -> Self {
        match rules.next_type_policy {
            NextTypePolicy::Random => Self::random(rules, types, StdRng::seed_from_u64(seed)),
            _ => Self::new(rules, types),
        }
    }

    /// Cycles `types` in order, wrapping around.
    pub fn deterministic(types: &[PieceType]) -> Self {
        Self::from_source(Source::Deterministic {
            types: types.to_vec(),
            cursor: 0,
        })
    }

    /// Weighted draw among both wildcards and the palette.
    ///
    /// The palette shares `other_pieces_weight` evenly.
    pub fn random(rules: &GameRules, types: &[PieceType], rng: StdRng) -> Self {
        let mut picker = WeightedPicker::default();
        picker.add(PieceType::MatchAll, f64::from(rules.match_all_weight));
        picker.add(PieceType::MatchNone, f64::from(rules.match_none_weight));
        if !types.is_empty() {
            let share = f64::from(rules.other_pieces_weight) / types.len() as f64;
            for kind in types {
                picker.add(*kind, share);
            }
        }
        debug!(entries = picker.len(), "Random queue ready");
        Self::from_source(Source::Random { picker, rng })
    }

    /// No queue: the next piece always repeats the removed piece.
    pub fn removed_type() -> Self {
        Self::from_source(Source::RemovedType)
    }

    fn from_source(source: Source) -> Self {
        Self {
            source,
            lookahead: VecDeque::new(),
            history: Vec::new(),
        }
    }

    /// The policy this queue follows.
    pub fn policy(&self) -> NextTypePolicy {
        match self.source {
            Source::Deterministic { .. } => NextTypePolicy::Deterministic,
            Source::Random { .. } => NextTypePolicy::Random,
            Source::RemovedType => NextTypePolicy::RemovedType,
        }
    }

    /// How many upcoming types are visible.
    pub fn lookahead_size(&self) -> usize {
        self.source.lookahead_size()
    }

    fn fill_lookahead(&mut self) {
        while self.lookahead.len() < self.lookahead_size() {
            match self.source.produce() {
                Some(kind) => self.lookahead.push_back(kind),
                None => break,
            }
        }
    }

    /// Consumes the next type. Returns `None` when the policy has no queue.
    pub fn next(&mut self) -> Option<PieceType> {
        self.fill_lookahead();
        let kind = self.lookahead.pop_front()?;
        self.history.push(kind);
        trace!(%kind, "Consumed incoming type");
        Some(kind)
    }

    /// Puts the most recently consumed type back at the front.
    ///
    /// Does nothing when nothing has been consumed.
    pub fn undo(&mut self) {
        if let Some(kind) = self.history.pop() {
            self.lookahead.push_front(kind);
            trace!(%kind, "Restored incoming type");
        }
    }

    /// The visible upcoming types, without consuming them.
    pub fn incoming(&mut self) -> Vec<PieceType> {
        self.fill_lookahead();
        self.lookahead
            .iter()
            .take(self.lookahead_size())
            .copied()
            .collect()
    }

    /// The type [`IncomingQueue::next`] would return.
    pub fn peek_next(&mut self) -> Option<PieceType> {
        self.incoming().first().copied()
    }

    /// Types consumed so far, oldest first.
    pub fn history(&self) -> &[PieceType] {
        &self.history
    }

    /// Forgets consumed types and restarts deterministic cycling.
    ///
    /// Buffered lookahead is discarded too, so a random queue draws fresh
    /// types after a reset instead of replaying the ones already peeked.
    pub fn reset(&mut self) {
        self.lookahead.clear();
        self.history.clear();
        if let Source::Deterministic { cursor, .. } = &mut self.source {
            *cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<PieceType> {
        PieceType::range(0, 3)
    }

    #[test]
    fn test_deterministic_cycles() {
        let mut queue = IncomingQueue::deterministic(&palette());
        let drawn: Vec<_> = (0..4).filter_map(|_| queue.next()).collect();
        assert_eq!(
            drawn,
            vec![
                PieceType::Normal(0),
                PieceType::Normal(1),
                PieceType::Normal(2),
                PieceType::Normal(0)
            ]
        );
    }

    #[test]
    fn test_incoming_shows_whole_palette() {
        let mut queue = IncomingQueue::deterministic(&palette());
        assert_eq!(queue.incoming(), palette());
        queue.next();
        assert_eq!(
            queue.incoming(),
            vec![PieceType::Normal(1), PieceType::Normal(2), PieceType::Normal(0)]
        );
        assert_eq!(queue.peek_next(), Some(PieceType::Normal(1)));
    }

    #[test]
    fn test_undo_reverses_next() {
        let mut queue = IncomingQueue::deterministic(&palette());
        queue.next();
        let before = queue.incoming();
        for _ in 0..3 {
            let drawn = queue.next();
            queue.undo();
            assert_eq!(queue.incoming(), before);
            assert_eq!(queue.next(), drawn);
            queue.undo();
        }
        assert_eq!(queue.history(), &[PieceType::Normal(0)]);
    }

    #[test]
    fn test_undo_on_fresh_queue_is_noop() {
        let mut queue = IncomingQueue::deterministic(&palette());
        queue.undo();
        assert_eq!(queue.next(), Some(PieceType::Normal(0)));
    }

    #[test]
    fn test_random_lookahead_counts_positive_weights() {
        let types = PieceType::range(0, 35);
        let arcade = GameRules::arcade();
        assert_eq!(IncomingQueue::with_seed(&arcade, &types, 1).lookahead_size(), 37);

        let no_wildcards = GameRules {
            match_none_weight: 0.0,
            ..GameRules::arcade()
        };
        assert_eq!(
            IncomingQueue::with_seed(&no_wildcards, &types, 1).lookahead_size(),
            36
        );

        let only_wildcards = GameRules {
            other_pieces_weight: 0.0,
            ..GameRules::arcade()
        };
        assert_eq!(
            IncomingQueue::with_seed(&only_wildcards, &types, 1).lookahead_size(),
            2
        );
    }

    #[test]
    fn test_random_is_reproducible_with_seed() {
        let rules = GameRules::arcade();
        let mut a = IncomingQueue::with_seed(&rules, &palette(), 42);
        let mut b = IncomingQueue::with_seed(&rules, &palette(), 42);
        for _ in 0..20 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn test_reset_rewinds_deterministic_queue() {
        let mut queue = IncomingQueue::deterministic(&palette());
        queue.next();
        queue.next();
        queue.reset();
        assert!(queue.history().is_empty());
        assert_eq!(queue.next(), Some(PieceType::Normal(0)));
    }

    #[test]
    fn test_reset_discards_peeked_random_draws() {
        let rules = GameRules::arcade();
        let mut queue = IncomingQueue::with_seed(&rules, &palette(), 42);
        let peeked = queue.incoming();
        queue.reset();
        let after_reset = queue.incoming();

        let mut reference = IncomingQueue::with_seed(&rules, &palette(), 42);
        for _ in 0..peeked.len() {
            reference.next();
        }
        assert_eq!(after_reset, reference.incoming());
    }

    #[test]
    fn test_removed_type_has_no_queue() {
        let mut queue = IncomingQueue::new(&GameRules::keep_same(), &palette());
        assert_eq!(queue.lookahead_size(), 0);
        assert!(queue.incoming().is_empty());
        assert_eq!(queue.peek_next(), None);
        assert_eq!(queue.next(), None);
        assert!(queue.history().is_empty());
        queue.undo();
    }

    #[test]
    fn test_picker_only_returns_positive_entries() {
        let mut picker = WeightedPicker::default();
        picker.add(PieceType::MatchAll, 0.0);
        picker.add(PieceType::Normal(4), 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(picker.pick(&mut rng), Some(PieceType::Normal(4)));
        }
        assert_eq!(WeightedPicker::default().pick(&mut rng), None);
    }
}
