//! Greedy 1:1 nearest-neighbor propensity-score matching without replacement.
//!
//! Treated units are visited in a fixed order. Each one takes the closest
//! remaining control by absolute score distance, ties going to the lowest
//! row index, and that control is removed from the pool. When the pool runs
//! dry the remaining treated units are left unmatched.
//!
//! The result is greedy, not globally optimal, and depends on the visiting
//! order.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use matchboot_core::{MatchOrder, Observation};

use crate::propensity::ScoredDataset;

/// One treated unit and the control it was matched to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    /// Row index of the treated unit in the source dataset.
    pub treated_index: usize,
    /// Row index of the control unit in the source dataset.
    pub control_index: usize,
    pub treated: Observation,
    pub control: Observation,
    pub treated_score: f64,
    pub control_score: f64,
}

impl MatchedPair {
    /// Absolute propensity-score distance within the pair.
    #[must_use]
    pub fn distance(&self) -> f64 {
        (self.treated_score - self.control_score).abs()
    }
}

/// Output of one matching run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchedDataset {
    pairs: Vec<MatchedPair>,
    unmatched_treated: Vec<usize>,
}

impl MatchedDataset {
    /// Matched pairs in the order they were formed.
    #[must_use]
    pub fn pairs(&self) -> &[MatchedPair] {
        &self.pairs
    }

    /// Row indices of treated units dropped because no control remained.
    #[must_use]
    pub fn unmatched_treated(&self) -> &[usize] {
        &self.unmatched_treated
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no pair was formed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Mean within-pair score distance, 0 when empty.
    #[must_use]
    pub fn mean_distance(&self) -> f64 {
        if self.pairs.is_empty() {
            return 0.0;
        }
        self.pairs.iter().map(MatchedPair::distance).sum::<f64>() / self.pairs.len() as f64
    }

    /// Returns true if no control row is used by more than one pair.
    #[must_use]
    pub fn controls_are_unique(&self) -> bool {
        let mut controls: Vec<usize> = self.pairs.iter().map(|p| p.control_index).collect();
        controls.sort_unstable();
        controls.windows(2).all(|w| w[0] != w[1])
    }
}

/// Greedy nearest-neighbor matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborMatcher {
    order: MatchOrder,
}

impl NearestNeighborMatcher {
    /// Creates a matcher visiting treated units in `order`.
    #[must_use]
    pub fn new(order: MatchOrder) -> Self {
        Self { order }
    }

    /// Visiting order of this matcher.
    #[must_use]
    pub fn order(&self) -> MatchOrder {
        self.order
    }

    /// Matches `scored` under the configured order.
    ///
    /// `rng` is only drawn from for [`MatchOrder::Shuffled`].
    pub fn match_units(&self, scored: &ScoredDataset<'_>, rng: &mut ChaCha8Rng) -> MatchedDataset {
        let mut treated: Vec<usize> = treated_rows(scored);
        if self.order == MatchOrder::Shuffled {
            treated.shuffle(rng);
        }
        match_in_order(scored, &treated)
    }
}

fn treated_rows(scored: &ScoredDataset<'_>) -> Vec<usize> {
    scored
        .dataset()
        .observations()
        .iter()
        .enumerate()
        .filter(|(_, o)| o.treated)
        .map(|(i, _)| i)
        .collect()
}

/// Matches treated rows in the given visiting order.
///
/// Entries of `treated_order` that are out of range or not treated rows are
/// ignored.
#[must_use]
pub fn match_in_order(scored: &ScoredDataset<'_>, treated_order: &[usize]) -> MatchedDataset {
    let observations = scored.dataset().observations();
    let scores = scored.scores();

    // Ascending row order, so a strict `<` keeps the lowest index on ties
    let mut available: Vec<usize> = observations
        .iter()
        .enumerate()
        .filter(|(_, o)| !o.treated)
        .map(|(i, _)| i)
        .collect();

    let mut pairs = Vec::with_capacity(treated_order.len().min(available.len()));
    let mut unmatched_treated = Vec::new();

    for &t in treated_order {
        if !observations.get(t).is_some_and(|o| o.treated) {
            continue;
        }
        if available.is_empty() {
            unmatched_treated.push(t);
            continue;
        }

        let treated_score = scores[t];
        let mut best_pos = 0;
        let mut best_distance = (treated_score - scores[available[0]]).abs();
        for (pos, &c) in available.iter().enumerate().skip(1) {
            let distance = (treated_score - scores[c]).abs();
            if distance < best_distance {
                best_distance = distance;
                best_pos = pos;
            }
        }

        let c = available.remove(best_pos);
        pairs.push(MatchedPair {
            treated_index: t,
            control_index: c,
            treated: observations[t],
            control: observations[c],
            treated_score,
            control_score: scores[c],
        });
    }

    MatchedDataset {
        pairs,
        unmatched_treated,
    }
}
