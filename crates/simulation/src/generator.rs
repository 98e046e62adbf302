//! Synthetic datasets with known treatment and outcome mechanisms.
//!
//! Continuous scenario:
//! ```text
//! X1 ~ N(0, 1), X2 ~ Bernoulli(0.5)
//! T  ~ Bernoulli(logistic(0.5 + 0.1 X1 - 0.2 X2))
//! Y  = 1 + 0.5 T + 0.3 X1 - 0.2 X2 + e,   e ~ N(0, sd^2)
//! ```
//!
//! Binary scenario:
//! ```text
//! X1 ~ N(0, 1), X2 ~ Bernoulli(0.5), T ~ Bernoulli(0.5)
//! Y  = 1[X1 + X2 - 1 + e + 0.5 T > 0],  e ~ N(0, sd^2)
//! ```
//!
//! Each row draws `X1`, `X2`, `T`, then `e`, in that order.

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use matchboot_core::{Dataset, Observation, Scenario};

use crate::rng::{bernoulli, standard_normal};

/// Logistic function.
#[must_use]
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// True treatment probability in the continuous scenario.
#[must_use]
pub fn true_propensity(x1: f64, x2: f64) -> f64 {
    logistic(0.5 + 0.1 * x1 - 0.2 * x2)
}

/// Configuration for the data generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Rows per dataset.
    pub sample_size: usize,
    /// Standard deviation of the outcome noise.
    pub noise_sd: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            noise_sd: 1.0,
        }
    }
}

impl GeneratorConfig {
    /// Creates a configuration for `sample_size` rows with unit noise.
    #[must_use]
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            ..Default::default()
        }
    }

    /// Sets the outcome noise standard deviation.
    #[must_use]
    pub fn with_noise_sd(mut self, noise_sd: f64) -> Self {
        self.noise_sd = noise_sd;
        self
    }
}

/// Draws synthetic datasets.
#[derive(Debug, Clone)]
pub struct DataGenerator {
    config: GeneratorConfig,
}

impl DataGenerator {
    /// Creates a generator with the given configuration.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Creates a generator with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(GeneratorConfig::default())
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Draws one dataset for `scenario`.
    pub fn generate(&self, scenario: Scenario, rng: &mut ChaCha8Rng) -> Dataset {
        let observations = (0..self.config.sample_size)
            .map(|_| match scenario {
                Scenario::Continuous => self.continuous_row(rng),
                Scenario::Binary => self.binary_row(rng),
            })
            .collect();
        Dataset::new(scenario, observations)
    }

    fn continuous_row(&self, rng: &mut ChaCha8Rng) -> Observation {
        let x1 = standard_normal(rng);
        let x2 = if bernoulli(rng, 0.5) { 1.0 } else { 0.0 };
        let treated = bernoulli(rng, true_propensity(x1, x2));
        let t = if treated { 1.0 } else { 0.0 };
        let noise = self.config.noise_sd * standard_normal(rng);

        let outcome = 1.0 + 0.5 * t + 0.3 * x1 - 0.2 * x2 + noise;
        Observation::new(treated, outcome, [x1, x2])
    }

    fn binary_row(&self, rng: &mut ChaCha8Rng) -> Observation {
        let x1 = standard_normal(rng);
        let x2 = if bernoulli(rng, 0.5) { 1.0 } else { 0.0 };
        let treated = bernoulli(rng, 0.5);
        let t = if treated { 1.0 } else { 0.0 };
        let noise = self.config.noise_sd * standard_normal(rng);

        let latent = x1 + x2 - 1.0 + noise + 0.5 * t;
        let outcome = if latent > 0.0 { 1.0 } else { 0.0 };
        Observation::new(treated, outcome, [x1, x2])
    }
}
