//! Monte Carlo evaluation of bootstrap variance estimators for
//! nearest-neighbor propensity-score matching.

pub mod bootstrap;
pub mod effect;
pub mod generator;
pub mod matching;
pub mod monte_carlo;
pub mod pipeline;
pub mod propensity;
pub mod replicate;
pub mod rng;

pub use bootstrap::{
    percentile_ci, BootstrapConfig, BootstrapSummary, ComplexBootstrap, SimpleBootstrap,
};
pub use effect::EffectEstimator;
pub use generator::{DataGenerator, GeneratorConfig};
pub use matching::{match_in_order, MatchedDataset, MatchedPair, NearestNeighborMatcher};
pub use monte_carlo::{
    DistributionSummary, MonteCarloHarness, ScenarioReport, SimulationReport, TrueVariability,
};
pub use pipeline::{EstimationPipeline, PipelineOutcome};
pub use propensity::{FittedLogistic, LogisticConfig, LogisticRegression, ScoredDataset};
pub use replicate::{run_replicates, sample_std_dev, ReplicateSet};
pub use rng::{RngStreams, StreamPurpose};
