//! Monte Carlo comparison of bootstrap standard errors against truth.
//!
//! For each scenario the harness draws `n_simulations` independent datasets,
//! runs fit, match, and estimate on each, and takes the standard deviation of
//! the resulting effects as the true sampling variability. It then draws one
//! more dataset, matches it, and runs the simple and complex bootstraps on it
//! so both standard errors can be set against the truth.
//!
//! # Example
//!
//! ```ignore
//! use matchboot_core::SimulationConfig;
//! use matchboot_simulation::MonteCarloHarness;
//!
//! let harness = MonteCarloHarness::new(SimulationConfig::default().with_seed(2024))?;
//! let report = harness.run()?;
//! for scenario in &report.scenarios {
//!     println!("{}: truth {:.4}, simple {:.4}, complex {:.4}",
//!         scenario.scenario,
//!         scenario.true_variability,
//!         scenario.simple_bootstrap_se,
//!         scenario.complex_bootstrap_se);
//! }
//! ```

use serde::{Deserialize, Serialize};

use matchboot_core::{
    MatchOrder, PropensityModel, Result, Scenario, SimulationConfig, SkipCounts,
};

use crate::bootstrap::{BootstrapConfig, BootstrapSummary, ComplexBootstrap, SimpleBootstrap};
use crate::effect::EffectEstimator;
use crate::generator::{DataGenerator, GeneratorConfig};
use crate::matching::NearestNeighborMatcher;
use crate::pipeline::EstimationPipeline;
use crate::propensity::LogisticRegression;
use crate::replicate::{run_replicates, ReplicateSet};
use crate::rng::{entropy_seed, RngStreams, StreamPurpose};

/// Summary statistics for a distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Mean value.
    pub mean: f64,
    /// Median value (50th percentile).
    pub median: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    /// Key percentiles (5th, 25th, 50th, 75th, 95th).
    pub percentiles: Vec<(f64, f64)>,
}

impl DistributionSummary {
    /// Creates a summary from a slice of values.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len();
        let median = percentile(&sorted, 0.50);

        Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean: crate::replicate::mean(&sorted),
            median,
            std_dev: crate::replicate::sample_std_dev(&sorted),
            percentiles: vec![
                (0.05, percentile(&sorted, 0.05)),
                (0.25, percentile(&sorted, 0.25)),
                (0.50, median),
                (0.75, percentile(&sorted, 0.75)),
                (0.95, percentile(&sorted, 0.95)),
            ],
        }
    }
}

/// Nearest-rank percentile of a sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let idx = (p * (n - 1) as f64).round() as usize;
    sorted[idx.min(n - 1)]
}

/// Empirical sampling distribution of the matched effect estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrueVariability {
    /// Sample standard deviation of the effect across simulations.
    pub standard_deviation: f64,
    /// Mean effect across simulations.
    pub mean_effect: f64,
    pub distribution: DistributionSummary,
    /// Simulations that produced an estimate.
    pub simulations_used: usize,
    /// Simulations dropped by cause.
    pub skipped: SkipCounts,
}

/// Everything measured for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub sample_size: usize,
    pub n_simulations: usize,
    pub n_replications: usize,
    pub seed: u64,
    pub match_order: MatchOrder,
    /// Standard deviation of the effect across independent datasets.
    pub true_variability: f64,
    /// Standard error from resampling matched pairs.
    pub simple_bootstrap_se: f64,
    /// Standard error from resampling raw rows and rematching.
    pub complex_bootstrap_se: f64,
    pub truth: TrueVariability,
    /// Effect on the dataset both bootstraps were run on.
    pub realized_effect: f64,
    pub realized_pairs: usize,
    pub realized_unmatched_treated: usize,
    pub simple_bootstrap: BootstrapSummary,
    pub complex_bootstrap: BootstrapSummary,
}

impl ScenarioReport {
    /// Signed relative error of the simple bootstrap SE against truth.
    #[must_use]
    pub fn simple_relative_error(&self) -> f64 {
        relative_error(self.simple_bootstrap_se, self.true_variability)
    }

    /// Signed relative error of the complex bootstrap SE against truth.
    #[must_use]
    pub fn complex_relative_error(&self) -> f64 {
        relative_error(self.complex_bootstrap_se, self.true_variability)
    }

    /// Returns true if the complex bootstrap lands closer to truth.
    #[must_use]
    pub fn complex_tracks_truth_better(&self) -> bool {
        (self.complex_bootstrap_se - self.true_variability).abs()
            < (self.simple_bootstrap_se - self.true_variability).abs()
    }
}

fn relative_error(estimate: f64, truth: f64) -> f64 {
    if truth == 0.0 {
        return 0.0;
    }
    (estimate - truth) / truth
}

/// Results for every configured scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Seed the run used; pass it back to reproduce the run.
    pub seed: u64,
    pub scenarios: Vec<ScenarioReport>,
}

impl SimulationReport {
    /// Report for `scenario`, if it was run.
    #[must_use]
    pub fn scenario(&self, scenario: Scenario) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|r| r.scenario == scenario)
    }
}

/// Drives the truth loop and both bootstraps.
pub struct MonteCarloHarness<M = LogisticRegression> {
    config: SimulationConfig,
    model: M,
}

impl MonteCarloHarness<LogisticRegression> {
    /// Creates a harness with the logistic propensity model.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` before any work if `config` is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_model(config, LogisticRegression::default())
    }
}

impl<M: PropensityModel + Clone> MonteCarloHarness<M> {
    /// Creates a harness with a custom propensity model.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` before any work if `config` is invalid.
    pub fn with_model(config: SimulationConfig, model: M) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, model })
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn generator(&self) -> DataGenerator {
        DataGenerator::new(
            GeneratorConfig::new(self.config.sample_size).with_noise_sd(self.config.noise_sd),
        )
    }

    fn pipeline(&self, scenario: Scenario) -> EstimationPipeline<M> {
        EstimationPipeline::new(
            self.model.clone(),
            NearestNeighborMatcher::new(self.config.match_order),
            EffectEstimator::new(scenario.outcome_kind()),
        )
    }

    fn bootstrap_config(&self) -> BootstrapConfig {
        BootstrapConfig::new(self.config.n_replications, self.config.confidence_level)
            .with_parallel(self.config.parallel)
    }

    /// Runs every configured scenario.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error from any scenario.
    pub fn run(&self) -> Result<SimulationReport> {
        let seed = self.config.seed.unwrap_or_else(entropy_seed);
        tracing::info!(
            seed,
            sample_size = self.config.sample_size,
            n_simulations = self.config.n_simulations,
            n_replications = self.config.n_replications,
            model = self.model.name(),
            "starting Monte Carlo study"
        );

        let scenarios = self
            .config
            .scenarios
            .iter()
            .map(|&scenario| self.run_scenario(scenario, seed))
            .collect::<Result<Vec<_>>>()?;

        Ok(SimulationReport { seed, scenarios })
    }

    /// Runs one scenario rooted at `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the realized dataset cannot be fitted or matched,
    /// or if a replicate fails with a non-skippable error.
    pub fn run_scenario(&self, scenario: Scenario, seed: u64) -> Result<ScenarioReport> {
        let streams = RngStreams::new(seed, scenario);
        let pipeline = self.pipeline(scenario);

        tracing::info!(%scenario, "measuring true variability");
        let truth = self.measure_truth(scenario, &pipeline, &streams)?;

        let mut data_rng = streams.stream(StreamPurpose::RealizedData, 0);
        let realized = self.generator().generate(scenario, &mut data_rng);
        let mut match_rng = streams.stream(StreamPurpose::RealizedMatch, 0);
        let outcome = pipeline.run(&realized, &mut match_rng)?;
        tracing::debug!(
            %scenario,
            effect = outcome.effect,
            pairs = outcome.matched.len(),
            unmatched = outcome.matched.unmatched_treated().len(),
            "matched realized dataset"
        );

        tracing::info!(%scenario, "running simple bootstrap");
        let simple = SimpleBootstrap::new(self.bootstrap_config()).estimate(
            &outcome.matched,
            pipeline.estimator(),
            &streams,
        )?;

        tracing::info!(%scenario, "running complex bootstrap");
        let complex = ComplexBootstrap::new(self.bootstrap_config(), &pipeline)
            .estimate(&realized, &streams)?;

        let report = ScenarioReport {
            scenario,
            sample_size: self.config.sample_size,
            n_simulations: self.config.n_simulations,
            n_replications: self.config.n_replications,
            seed,
            match_order: self.config.match_order,
            true_variability: truth.standard_deviation,
            simple_bootstrap_se: simple.standard_error,
            complex_bootstrap_se: complex.standard_error,
            truth,
            realized_effect: outcome.effect,
            realized_pairs: outcome.matched.len(),
            realized_unmatched_treated: outcome.matched.unmatched_treated().len(),
            simple_bootstrap: simple,
            complex_bootstrap: complex,
        };

        tracing::info!(
            %scenario,
            true_variability = report.true_variability,
            simple_se = report.simple_bootstrap_se,
            complex_se = report.complex_bootstrap_se,
            "scenario complete"
        );

        Ok(report)
    }

    /// Builds the sampling distribution of the effect over independent datasets.
    ///
    /// Simulation `i` draws its data from the [`StreamPurpose::TruthData`]
    /// stream `i` and any treated-unit shuffle from [`StreamPurpose::TruthMatch`]
    /// stream `i`. Failed simulations are skipped and counted.
    ///
    /// # Errors
    ///
    /// Returns the first non-skippable error.
    pub fn true_variability(&self, scenario: Scenario, seed: u64) -> Result<TrueVariability> {
        let streams = RngStreams::new(seed, scenario);
        self.measure_truth(scenario, &self.pipeline(scenario), &streams)
    }

    fn measure_truth(
        &self,
        scenario: Scenario,
        pipeline: &EstimationPipeline<M>,
        streams: &RngStreams,
    ) -> Result<TrueVariability> {
        let generator = self.generator();

        let results = run_replicates(self.config.n_simulations, self.config.parallel, |i| {
            let mut data_rng = streams.stream(StreamPurpose::TruthData, i);
            let dataset = generator.generate(scenario, &mut data_rng);
            let mut match_rng = streams.stream(StreamPurpose::TruthMatch, i);
            pipeline.run(&dataset, &mut match_rng).map(|outcome| outcome.effect)
        });
        let replicates = ReplicateSet::collect(results)?;

        if !replicates.skipped().is_empty() {
            tracing::warn!(
                model_fit_failures = replicates.skipped().model_fit_failures,
                empty_groups = replicates.skipped().empty_groups,
                "simulations skipped while measuring true variability"
            );
        }

        Ok(TrueVariability {
            standard_deviation: replicates.standard_deviation(),
            mean_effect: replicates.mean(),
            distribution: DistributionSummary::from_values(replicates.estimates()),
            simulations_used: replicates.len(),
            skipped: replicates.skipped(),
        })
    }
}
