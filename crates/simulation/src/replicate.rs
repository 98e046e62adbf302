//! Running independent replicates and folding their results.
//!
//! Each replicate is a pure function of its index. Results come back as an
//! ordered vector and are combined afterwards, so the sequential and parallel
//! paths see exactly the same values.

use rayon::prelude::*;

use matchboot_core::{Result, SkipCounts};

/// Runs `replicate(0..count)`, on the rayon pool when `parallel` is set.
///
/// The output is in index order either way.
pub fn run_replicates<F>(count: usize, parallel: bool, replicate: F) -> Vec<Result<f64>>
where
    F: Fn(usize) -> Result<f64> + Sync + Send,
{
    if parallel {
        (0..count).into_par_iter().map(replicate).collect()
    } else {
        (0..count).map(replicate).collect()
    }
}

/// Successful replicate estimates plus a tally of skipped ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplicateSet {
    estimates: Vec<f64>,
    skipped: SkipCounts,
}

impl ReplicateSet {
    /// Folds replicate results, counting skippable failures.
    ///
    /// # Errors
    ///
    /// Returns the first non-skippable error.
    pub fn collect(results: Vec<Result<f64>>) -> Result<Self> {
        let mut estimates = Vec::with_capacity(results.len());
        let mut skipped = SkipCounts::default();

        for result in results {
            match result {
                Ok(estimate) => estimates.push(estimate),
                Err(err) => skipped.absorb(err)?,
            }
        }

        Ok(Self { estimates, skipped })
    }

    /// Estimates from successful replicates, in index order.
    #[must_use]
    pub fn estimates(&self) -> &[f64] {
        &self.estimates
    }

    /// Skipped replicates by cause.
    #[must_use]
    pub fn skipped(&self) -> SkipCounts {
        self.skipped
    }

    /// Number of successful replicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    /// Returns true if every replicate was skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// Mean of the estimates, 0 when empty.
    #[must_use]
    pub fn mean(&self) -> f64 {
        mean(&self.estimates)
    }

    /// Sample standard deviation of the estimates.
    #[must_use]
    pub fn standard_deviation(&self) -> f64 {
        sample_std_dev(&self.estimates)
    }
}

/// Arithmetic mean, 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with the `n - 1` denominator.
///
/// Fewer than two values give 0.
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
