//! Observations, datasets, and the two simulated scenarios.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of covariates carried by every observation (`X1` continuous, `X2` binary).
pub const N_COVARIATES: usize = 2;

/// Generative scheme used to simulate a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Confounded treatment with a normally distributed outcome.
    Continuous,
    /// Randomised treatment with a 0/1 outcome.
    Binary,
}

impl Scenario {
    /// All scenarios, in reporting order.
    pub const ALL: [Scenario; 2] = [Scenario::Continuous, Scenario::Binary];

    /// Kind of outcome the scenario produces.
    #[must_use]
    pub fn outcome_kind(self) -> OutcomeKind {
        match self {
            Scenario::Continuous => OutcomeKind::Continuous,
            Scenario::Binary => OutcomeKind::Binary,
        }
    }

    /// Lowercase name, as used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Continuous => "continuous",
            Scenario::Binary => "binary",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continuous" => Ok(Scenario::Continuous),
            "binary" => Ok(Scenario::Binary),
            _ => Err(format!(
                "Unknown scenario: '{}'. Valid scenarios: continuous, binary",
                s
            )),
        }
    }
}

/// How an outcome is summarised within each arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    /// Arm mean of a real-valued outcome.
    Continuous,
    /// Arm proportion of positive outcomes.
    Binary,
}

/// One simulated unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Treatment indicator.
    pub treated: bool,
    /// Outcome; 0.0 or 1.0 in the binary scenario.
    pub outcome: f64,
    /// Covariates `[X1, X2]`.
    pub covariates: [f64; N_COVARIATES],
}

impl Observation {
    /// Creates an observation.
    #[must_use]
    pub fn new(treated: bool, outcome: f64, covariates: [f64; N_COVARIATES]) -> Self {
        Self {
            treated,
            outcome,
            covariates,
        }
    }

    /// Treatment as a 0/1 number.
    #[must_use]
    pub fn treatment(&self) -> f64 {
        if self.treated {
            1.0
        } else {
            0.0
        }
    }
}

/// Ordered collection of observations produced by one draw or resample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    scenario: Scenario,
    observations: Vec<Observation>,
}

impl Dataset {
    /// Wraps observations generated under `scenario`.
    #[must_use]
    pub fn new(scenario: Scenario, observations: Vec<Observation>) -> Self {
        Self {
            scenario,
            observations,
        }
    }

    /// Scenario the rows were generated under.
    #[must_use]
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Rows in order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of treated rows.
    #[must_use]
    pub fn treated_count(&self) -> usize {
        self.observations.iter().filter(|o| o.treated).count()
    }

    /// Builds a new dataset from rows picked by index, duplicates allowed.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            scenario: self.scenario,
            observations: indices.iter().map(|&i| self.observations[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> Dataset {
        Dataset::new(
            Scenario::Continuous,
            vec![
                Observation::new(true, 2.0, [0.1, 1.0]),
                Observation::new(false, 1.0, [-0.3, 0.0]),
                Observation::new(true, 4.0, [1.2, 0.0]),
            ],
        )
    }

    #[test]
    fn scenario_parses_case_insensitively() {
        assert_eq!("continuous".parse::<Scenario>().unwrap(), Scenario::Continuous);
        assert_eq!("BINARY".parse::<Scenario>().unwrap(), Scenario::Binary);
        assert!("poisson".parse::<Scenario>().is_err());
    }

    #[test]
    fn scenario_maps_to_outcome_kind() {
        assert_eq!(Scenario::Continuous.outcome_kind(), OutcomeKind::Continuous);
        assert_eq!(Scenario::Binary.outcome_kind(), OutcomeKind::Binary);
    }

    #[test]
    fn scenario_serializes_lowercase() {
        let json = serde_json::to_string(&Scenario::Binary).unwrap();
        assert_eq!(json, "\"binary\"");
    }

    #[test]
    fn dataset_counts_treated_rows() {
        let dataset = sample_dataset();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.treated_count(), 2);
        assert!(!dataset.is_empty());
    }

    #[test]
    fn select_allows_duplicates_and_keeps_scenario() {
        let dataset = sample_dataset();
        let resampled = dataset.select(&[2, 2, 1]);

        assert_eq!(resampled.len(), 3);
        assert_eq!(resampled.scenario(), Scenario::Continuous);
        assert_eq!(resampled.observations()[0], resampled.observations()[1]);
        assert!(!resampled.observations()[2].treated);
    }

    #[test]
    fn treatment_is_numeric_indicator() {
        assert!((Observation::new(true, 0.0, [0.0, 0.0]).treatment() - 1.0).abs() < f64::EPSILON);
        assert!(Observation::new(false, 0.0, [0.0, 0.0]).treatment().abs() < f64::EPSILON);
    }
}
