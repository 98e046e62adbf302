//! Simple and complex bootstrap standard errors for matched effect estimates.
//!
//! The simple bootstrap resamples matched pairs and only recomputes the
//! effect. The complex bootstrap resamples raw rows and reruns the whole
//! fit, match, and estimate pipeline per replicate, so it also captures the
//! variability of the propensity model and of the matching itself.
//!
//! # Example
//!
//! ```ignore
//! use matchboot_simulation::bootstrap::{BootstrapConfig, SimpleBootstrap};
//!
//! let bootstrap = SimpleBootstrap::new(BootstrapConfig::new(1000, 0.95));
//! let summary = bootstrap.estimate(&matched, &estimator, &streams)?;
//! println!("SE: {:.4} [{:.4}, {:.4}]",
//!     summary.standard_error,
//!     summary.ci_lower,
//!     summary.ci_upper);
//! ```

use serde::{Deserialize, Serialize};

use matchboot_core::{Dataset, PropensityModel, Result, SkipCounts};

use crate::effect::EffectEstimator;
use crate::matching::MatchedDataset;
use crate::pipeline::EstimationPipeline;
use crate::replicate::{run_replicates, ReplicateSet};
use crate::rng::{resample_indices, RngStreams, StreamPurpose};

/// Configuration shared by both bootstrap methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Number of bootstrap replicates.
    pub n_replications: usize,
    /// Confidence level for the percentile interval.
    pub confidence_level: f64,
    /// Run replicates on the rayon pool.
    pub parallel: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_replications: 1000,
            confidence_level: 0.95,
            parallel: false,
        }
    }
}

impl BootstrapConfig {
    /// Creates a new configuration with specified parameters.
    #[must_use]
    pub fn new(n_replications: usize, confidence_level: f64) -> Self {
        Self {
            n_replications,
            confidence_level,
            parallel: false,
        }
    }

    /// Enables or disables parallel replicates.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Outcome of one bootstrap run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapSummary {
    /// Estimate on the original sample.
    pub point_estimate: f64,
    /// Sample standard deviation of the replicate estimates.
    pub standard_error: f64,
    /// Lower percentile bound.
    pub ci_lower: f64,
    /// Upper percentile bound.
    pub ci_upper: f64,
    /// Mean of replicate estimates minus the point estimate.
    pub bias: f64,
    pub replications_requested: usize,
    pub replications_used: usize,
    /// Replicates dropped by cause.
    pub skipped: SkipCounts,
}

impl BootstrapSummary {
    fn from_replicates(
        point_estimate: f64,
        replicates: &ReplicateSet,
        requested: usize,
        confidence_level: f64,
    ) -> Self {
        let mut sorted = replicates.estimates().to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let (ci_lower, ci_upper) = percentile_ci(&sorted, confidence_level);

        let bias = if replicates.is_empty() {
            0.0
        } else {
            replicates.mean() - point_estimate
        };

        Self {
            point_estimate,
            standard_error: replicates.standard_deviation(),
            ci_lower,
            ci_upper,
            bias,
            replications_requested: requested,
            replications_used: replicates.len(),
            skipped: replicates.skipped(),
        }
    }

    /// Returns the width of the confidence interval.
    #[must_use]
    pub fn ci_width(&self) -> f64 {
        self.ci_upper - self.ci_lower
    }
}

fn warn_if_thin(method: &str, summary: &BootstrapSummary) {
    if !summary.skipped.is_empty() {
        tracing::warn!(
            method,
            model_fit_failures = summary.skipped.model_fit_failures,
            empty_groups = summary.skipped.empty_groups,
            "bootstrap replicates skipped"
        );
    }
    if summary.replications_used < 2 {
        tracing::warn!(
            method,
            used = summary.replications_used,
            "fewer than two usable replicates, standard error reported as 0"
        );
    }
}

/// Resamples matched pairs with replacement; no model is refitted.
#[derive(Debug, Clone, Default)]
pub struct SimpleBootstrap {
    config: BootstrapConfig,
}

impl SimpleBootstrap {
    /// Creates a simple bootstrap with the given configuration.
    #[must_use]
    pub fn new(config: BootstrapConfig) -> Self {
        Self { config }
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Estimates the standard error of the effect on `matched`.
    ///
    /// Replicate `i` draws its pair indices from the
    /// [`StreamPurpose::SimpleResample`] stream `i`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyGroup` if `matched` has no pairs.
    pub fn estimate(
        &self,
        matched: &MatchedDataset,
        estimator: &EffectEstimator,
        streams: &RngStreams,
    ) -> Result<BootstrapSummary> {
        let point_estimate = estimator.estimate(matched)?;
        let pairs = matched.pairs();

        let results = run_replicates(self.config.n_replications, self.config.parallel, |i| {
            let mut rng = streams.stream(StreamPurpose::SimpleResample, i);
            let indices = resample_indices(pairs.len(), &mut rng);
            estimator.estimate_pairs(indices.iter().map(|&j| &pairs[j]))
        });
        let replicates = ReplicateSet::collect(results)?;

        let summary = BootstrapSummary::from_replicates(
            point_estimate,
            &replicates,
            self.config.n_replications,
            self.config.confidence_level,
        );
        tracing::debug!(
            pairs = pairs.len(),
            standard_error = summary.standard_error,
            "simple bootstrap finished"
        );
        warn_if_thin("simple", &summary);

        Ok(summary)
    }
}

/// Resamples raw rows and reruns fit, match, and estimate per replicate.
#[derive(Debug, Clone)]
pub struct ComplexBootstrap<'a, M> {
    config: BootstrapConfig,
    pipeline: &'a EstimationPipeline<M>,
}

impl<'a, M: PropensityModel> ComplexBootstrap<'a, M> {
    /// Creates a complex bootstrap driving `pipeline`.
    #[must_use]
    pub fn new(config: BootstrapConfig, pipeline: &'a EstimationPipeline<M>) -> Self {
        Self { config, pipeline }
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Estimates the standard error of the matched effect on `raw`.
    ///
    /// The point estimate reruns the pipeline on `raw` with the
    /// [`StreamPurpose::RealizedMatch`] stream, which reproduces the match
    /// the harness made on the same dataset. Replicate `i` draws rows and any
    /// treated-unit shuffle from the [`StreamPurpose::ComplexResample`]
    /// stream `i`. Replicates whose fit fails or whose matched sample has an
    /// empty arm are skipped and counted.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline fails on `raw` itself.
    pub fn estimate(&self, raw: &Dataset, streams: &RngStreams) -> Result<BootstrapSummary> {
        let mut point_rng = streams.stream(StreamPurpose::RealizedMatch, 0);
        let point_estimate = self.pipeline.run(raw, &mut point_rng)?.effect;

        let results = run_replicates(self.config.n_replications, self.config.parallel, |i| {
            let mut rng = streams.stream(StreamPurpose::ComplexResample, i);
            let indices = resample_indices(raw.len(), &mut rng);
            let resample = raw.select(&indices);
            self.pipeline.run(&resample, &mut rng).map(|outcome| outcome.effect)
        });
        let replicates = ReplicateSet::collect(results)?;

        let summary = BootstrapSummary::from_replicates(
            point_estimate,
            &replicates,
            self.config.n_replications,
            self.config.confidence_level,
        );
        tracing::debug!(
            rows = raw.len(),
            standard_error = summary.standard_error,
            skipped = summary.skipped.total(),
            "complex bootstrap finished"
        );
        warn_if_thin("complex", &summary);

        Ok(summary)
    }
}

/// Extracts percentile confidence interval from a sorted distribution.
///
/// # Arguments
/// * `distribution` - Sorted vector of bootstrap statistics
/// * `confidence_level` - Desired confidence level (e.g., 0.95)
///
/// # Returns
/// Tuple of (lower_bound, upper_bound)
#[must_use]
pub fn percentile_ci(distribution: &[f64], confidence_level: f64) -> (f64, f64) {
    if distribution.is_empty() {
        return (0.0, 0.0);
    }
    if distribution.len() == 1 {
        return (distribution[0], distribution[0]);
    }

    let alpha = 1.0 - confidence_level;
    let n = distribution.len();

    let lower_idx = ((alpha / 2.0) * n as f64).floor() as usize;
    let upper_idx = ((1.0 - alpha / 2.0) * n as f64).ceil() as usize;

    let lower_idx = lower_idx.min(n - 1);
    let upper_idx = upper_idx.min(n - 1).max(lower_idx);

    (distribution[lower_idx], distribution[upper_idx])
}
