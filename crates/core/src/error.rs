//! Error model shared by every simulation stage.
//!
//! Two error kinds are recoverable at the replicate level: a propensity
//! model that cannot be fitted, and a matched sample with an empty arm.
//! Bootstrap and Monte Carlo loops absorb those into [`SkipCounts`] and keep
//! going. Everything else is fatal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias for results produced by simulation stages.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Reasons a propensity model fit can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitFailure {
    /// No rows to fit on.
    #[error("dataset has no observations")]
    EmptyDataset,

    /// Treatment is all 0 or all 1, so the likelihood has no maximum.
    #[error("treatment is degenerate ({treated} of {observations} observations treated)")]
    DegenerateResponse {
        /// Number of treated rows.
        treated: usize,
        /// Total number of rows.
        observations: usize,
    },

    /// The information matrix could not be factorised.
    #[error("information matrix is singular at iteration {iteration}")]
    SingularInformation {
        /// Newton iteration at which the factorisation failed.
        iteration: usize,
    },

    /// Coefficients overflowed or became NaN.
    #[error("coefficients became non-finite at iteration {iteration}")]
    NonFiniteCoefficients {
        /// Newton iteration that produced the bad update.
        iteration: usize,
    },

    /// The iteration limit was reached, typically under complete separation.
    #[error("fit did not converge after {iterations} iterations")]
    NonConvergence {
        /// Iterations performed.
        iterations: usize,
    },
}

/// Errors raised by data generation, estimation, matching, and the harness.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// The propensity model could not be fitted.
    #[error("propensity model fit failed: {reason}")]
    ModelFitFailure {
        /// Why the fit failed.
        reason: FitFailure,
    },

    /// The matched sample lacks treated or control rows.
    #[error("matched sample has an empty group ({treated} treated, {control} control)")]
    EmptyGroup {
        /// Treated rows in the matched sample.
        treated: usize,
        /// Control rows in the matched sample.
        control: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Scores were paired with a dataset of a different length.
    #[error("got {scores} propensity scores for {observations} observations")]
    ScoreLengthMismatch {
        /// Number of scores supplied.
        scores: usize,
        /// Number of rows in the dataset.
        observations: usize,
    },
}

impl SimulationError {
    /// Returns true if a replicate failing with this error may be skipped.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            SimulationError::ModelFitFailure { .. } | SimulationError::EmptyGroup { .. }
        )
    }
}

impl From<FitFailure> for SimulationError {
    fn from(reason: FitFailure) -> Self {
        SimulationError::ModelFitFailure { reason }
    }
}

/// Tally of replicates dropped from a Monte Carlo or bootstrap loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    /// Replicates lost to a failed propensity fit.
    pub model_fit_failures: usize,
    /// Replicates lost to an empty matched arm.
    pub empty_groups: usize,
}

impl SkipCounts {
    /// Records a replicate failure.
    ///
    /// Skippable errors are counted and swallowed; any other error is
    /// handed back so the caller can abort.
    ///
    /// # Errors
    ///
    /// Returns `error` unchanged when it is not skippable.
    pub fn absorb(&mut self, error: SimulationError) -> Result<()> {
        match error {
            SimulationError::ModelFitFailure { .. } => {
                self.model_fit_failures += 1;
                Ok(())
            }
            SimulationError::EmptyGroup { .. } => {
                self.empty_groups += 1;
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Total number of skipped replicates.
    #[must_use]
    pub fn total(&self) -> usize {
        self.model_fit_failures + self.empty_groups
    }

    /// Returns true if no replicate was skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
