//! Treatment-effect point estimates on matched samples.

use matchboot_core::{Observation, OutcomeKind, Result, SimulationError};

use crate::matching::{MatchedDataset, MatchedPair};

/// Difference in arm summaries, treated minus control.
///
/// Continuous outcomes are summarised by their mean. Binary outcomes are
/// summarised by the proportion of positive outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectEstimator {
    kind: OutcomeKind,
}

impl EffectEstimator {
    /// Creates an estimator for `kind` outcomes.
    #[must_use]
    pub fn new(kind: OutcomeKind) -> Self {
        Self { kind }
    }

    /// Outcome kind this estimator summarises.
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    /// Effect over every pair of a matching run.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::EmptyGroup` if nothing was matched.
    pub fn estimate(&self, matched: &MatchedDataset) -> Result<f64> {
        self.estimate_pairs(matched.pairs())
    }

    /// Effect over an arbitrary collection of pairs, duplicates allowed.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::EmptyGroup` if `pairs` is empty.
    pub fn estimate_pairs<'a, I>(&self, pairs: I) -> Result<f64>
    where
        I: IntoIterator<Item = &'a MatchedPair>,
    {
        self.estimate_rows(
            pairs
                .into_iter()
                .flat_map(|p| [&p.treated, &p.control]),
        )
    }

    /// Effect over loose rows, split by their treatment flag.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::EmptyGroup` if either arm has no rows.
    pub fn estimate_rows<'a, I>(&self, rows: I) -> Result<f64>
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let mut treated = ArmSummary::default();
        let mut control = ArmSummary::default();

        for row in rows {
            let value = self.outcome_value(row.outcome);
            if row.treated {
                treated.push(value);
            } else {
                control.push(value);
            }
        }

        match (treated.mean(), control.mean()) {
            (Some(t), Some(c)) => Ok(t - c),
            _ => Err(SimulationError::EmptyGroup {
                treated: treated.count,
                control: control.count,
            }),
        }
    }

    fn outcome_value(&self, outcome: f64) -> f64 {
        match self.kind {
            OutcomeKind::Continuous => outcome,
            OutcomeKind::Binary => {
                if outcome > 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct ArmSummary {
    count: usize,
    sum: f64,
}

impl ArmSummary {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(index: usize, treated_outcome: f64, control_outcome: f64) -> MatchedPair {
        MatchedPair {
            treated_index: 2 * index,
            control_index: 2 * index + 1,
            treated: Observation::new(true, treated_outcome, [0.0, 0.0]),
            control: Observation::new(false, control_outcome, [0.0, 0.0]),
            treated_score: 0.5,
            control_score: 0.5,
        }
    }

    #[test]
    fn continuous_effect_is_mean_difference() {
        let estimator = EffectEstimator::new(OutcomeKind::Continuous);
        let pairs = [pair(0, 2.0, 1.0), pair(1, 4.0, 1.0)];

        let effect = estimator.estimate_pairs(&pairs).unwrap();

        assert!((effect - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn binary_effect_is_proportion_difference() {
        let estimator = EffectEstimator::new(OutcomeKind::Binary);
        let pairs = [pair(0, 1.0, 0.0), pair(1, 0.0, 0.0)];

        let effect = estimator.estimate_pairs(&pairs).unwrap();

        assert!((effect - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn duplicated_pairs_are_weighted() {
        let estimator = EffectEstimator::new(OutcomeKind::Continuous);
        let a = pair(0, 3.0, 1.0);
        let b = pair(1, 1.0, 1.0);

        let effect = estimator.estimate_pairs([&a, &a, &b]).unwrap();

        // treated mean 7/3, control mean 1
        assert!((effect - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_match_is_empty_group() {
        let estimator = EffectEstimator::new(OutcomeKind::Continuous);

        let err = estimator.estimate(&MatchedDataset::default()).unwrap_err();

        assert_eq!(
            err,
            SimulationError::EmptyGroup {
                treated: 0,
                control: 0
            }
        );
    }

    #[test]
    fn rows_without_controls_are_empty_group() {
        let estimator = EffectEstimator::new(OutcomeKind::Binary);
        let rows = [
            Observation::new(true, 1.0, [0.0, 0.0]),
            Observation::new(true, 0.0, [0.0, 1.0]),
        ];

        let err = estimator.estimate_rows(&rows).unwrap_err();

        assert_eq!(
            err,
            SimulationError::EmptyGroup {
                treated: 2,
                control: 0
            }
        );
    }
}
