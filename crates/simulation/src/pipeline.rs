//! Fit, match, and estimate as one reusable unit.
//!
//! The Monte Carlo loop, the realized dataset, and every complex bootstrap
//! replicate all run the same three stages.

use rand_chacha::ChaCha8Rng;

use matchboot_core::{Dataset, PropensityModel, Result};

use crate::effect::EffectEstimator;
use crate::matching::{MatchedDataset, NearestNeighborMatcher};
use crate::propensity::ScoredDataset;

/// Result of running the pipeline on one dataset.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Treatment-effect estimate on the matched sample.
    pub effect: f64,
    /// The matched sample itself.
    pub matched: MatchedDataset,
}

/// Propensity fit, nearest-neighbor matching, and effect estimation.
#[derive(Debug, Clone)]
pub struct EstimationPipeline<M> {
    model: M,
    matcher: NearestNeighborMatcher,
    estimator: EffectEstimator,
}

impl<M: PropensityModel> EstimationPipeline<M> {
    /// Assembles a pipeline from its stages.
    #[must_use]
    pub fn new(model: M, matcher: NearestNeighborMatcher, estimator: EffectEstimator) -> Self {
        Self {
            model,
            matcher,
            estimator,
        }
    }

    /// Propensity model stage.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Matching stage.
    #[must_use]
    pub fn matcher(&self) -> &NearestNeighborMatcher {
        &self.matcher
    }

    /// Effect estimation stage.
    #[must_use]
    pub fn estimator(&self) -> &EffectEstimator {
        &self.estimator
    }

    /// Refits the propensity model on `dataset`, matches, and estimates.
    ///
    /// # Errors
    ///
    /// Returns `ModelFitFailure` from the fit or `EmptyGroup` from the
    /// estimate.
    pub fn run(&self, dataset: &Dataset, rng: &mut ChaCha8Rng) -> Result<PipelineOutcome> {
        let fitted = self.model.fit(dataset)?;
        let scored = ScoredDataset::from_scorer(dataset, &fitted);
        let matched = self.matcher.match_units(&scored, rng);
        let effect = self.estimator.estimate(&matched)?;
        Ok(PipelineOutcome { effect, matched })
    }
}
