use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::observation::Scenario;

/// Order in which treated units are visited by the greedy matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOrder {
    /// Visit treated units in row order.
    #[default]
    #[serde(alias = "dataset_order")]
    Dataset,
    /// Visit treated units in a seeded random permutation.
    Shuffled,
}

impl fmt::Display for MatchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOrder::Dataset => f.write_str("dataset"),
            MatchOrder::Shuffled => f.write_str("shuffled"),
        }
    }
}

impl FromStr for MatchOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dataset" | "dataset_order" => Ok(MatchOrder::Dataset),
            "shuffled" | "random" => Ok(MatchOrder::Shuffled),
            _ => Err(format!(
                "Unknown match order: '{}'. Valid orders: dataset, shuffled",
                s
            )),
        }
    }
}

/// Parameters of one simulation study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Rows per simulated dataset.
    pub sample_size: usize,
    /// Independent datasets used to measure true variability.
    pub n_simulations: usize,
    /// Bootstrap replicates per method.
    pub n_replications: usize,
    /// Scenarios to run, in order.
    pub scenarios: Vec<Scenario>,
    /// Base seed; drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Standard deviation of the outcome noise term.
    pub noise_sd: f64,
    pub match_order: MatchOrder,
    /// Coverage of the bootstrap percentile intervals.
    pub confidence_level: f64,
    /// Run replicate loops on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            n_simulations: 1000,
            n_replications: 1000,
            scenarios: Scenario::ALL.to_vec(),
            seed: None,
            noise_sd: 1.0,
            match_order: MatchOrder::Dataset,
            confidence_level: 0.95,
            parallel: false,
        }
    }
}

impl SimulationConfig {
    /// Creates a configuration with explicit sizes and defaults elsewhere.
    #[must_use]
    pub fn new(sample_size: usize, n_simulations: usize, n_replications: usize) -> Self {
        Self {
            sample_size,
            n_simulations,
            n_replications,
            ..Default::default()
        }
    }

    /// Sets a seed for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Restricts the run to the given scenarios.
    #[must_use]
    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Sets the outcome noise standard deviation.
    #[must_use]
    pub fn with_noise_sd(mut self, noise_sd: f64) -> Self {
        self.noise_sd = noise_sd;
        self
    }

    /// Sets the treated-unit visiting order for matching.
    #[must_use]
    pub fn with_match_order(mut self, match_order: MatchOrder) -> Self {
        self.match_order = match_order;
        self
    }

    /// Enables or disables parallel replicate loops.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks every field before any simulation work starts.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfiguration` naming the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(invalid("sample_size must be positive"));
        }
        if self.n_simulations == 0 {
            return Err(invalid("n_simulations must be positive"));
        }
        if self.n_replications == 0 {
            return Err(invalid("n_replications must be positive"));
        }
        if self.scenarios.is_empty() {
            return Err(invalid("at least one scenario is required"));
        }
        if !self.noise_sd.is_finite() || self.noise_sd < 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "noise_sd must be finite and non-negative, got {}",
                self.noise_sd
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> SimulationError {
    SimulationError::InvalidConfiguration(message.to_string())
}
