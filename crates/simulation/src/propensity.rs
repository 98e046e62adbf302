//! Logistic-regression propensity model.
//!
//! Fits `P(T = 1 | X) = logistic(b0 + b1 X1 + b2 X2)` by Newton-Raphson on
//! the log-likelihood, which is the same iteration as IRLS. Each step solves
//! `H delta = g` with a Cholesky factorisation of the 3x3 information
//! matrix `H = X' W X`.

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

use matchboot_core::{
    Dataset, FitFailure, Observation, PropensityModel, PropensityScorer, Result, SimulationError,
    N_COVARIATES,
};

use crate::generator::logistic;

/// Intercept plus one coefficient per covariate.
pub const N_COEFFICIENTS: usize = N_COVARIATES + 1;

type Coefficients = SVector<f64, N_COEFFICIENTS>;
type Information = SMatrix<f64, N_COEFFICIENTS, N_COEFFICIENTS>;

/// Newton-Raphson settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Iteration cap before declaring non-convergence.
    pub max_iterations: usize,
    /// Convergence threshold on the largest absolute coefficient update.
    pub tolerance: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            tolerance: 1e-8,
        }
    }
}

/// Maximum-likelihood logistic regression of treatment on covariates.
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: LogisticConfig,
}

impl LogisticRegression {
    /// Creates a model with the given solver settings.
    #[must_use]
    pub fn new(config: LogisticConfig) -> Self {
        Self { config }
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }
}

fn design_row(observation: &Observation) -> Coefficients {
    let [x1, x2] = observation.covariates;
    Coefficients::new(1.0, x1, x2)
}

impl PropensityModel for LogisticRegression {
    type Fitted = FittedLogistic;

    fn fit(&self, dataset: &Dataset) -> Result<FittedLogistic> {
        if dataset.is_empty() {
            return Err(FitFailure::EmptyDataset.into());
        }

        let n = dataset.len();
        let treated = dataset.treated_count();
        if treated == 0 || treated == n {
            return Err(FitFailure::DegenerateResponse {
                treated,
                observations: n,
            }
            .into());
        }

        let rows: Vec<(Coefficients, f64)> = dataset
            .observations()
            .iter()
            .map(|o| (design_row(o), o.treatment()))
            .collect();

        let mut beta = Coefficients::zeros();

        for iteration in 0..self.config.max_iterations {
            let mut gradient = Coefficients::zeros();
            let mut information = Information::zeros();

            for (x, y) in &rows {
                let p = logistic(beta.dot(x));
                gradient += x * (y - p);
                information += (x * x.transpose()) * (p * (1.0 - p));
            }

            let step = information
                .cholesky()
                .ok_or(FitFailure::SingularInformation { iteration })?
                .solve(&gradient);

            beta += step;

            if !beta.iter().all(|b| b.is_finite()) {
                return Err(FitFailure::NonFiniteCoefficients { iteration }.into());
            }

            if step.amax() < self.config.tolerance {
                tracing::trace!(iterations = iteration + 1, "logistic fit converged");
                return Ok(FittedLogistic {
                    coefficients: beta,
                    iterations: iteration + 1,
                });
            }
        }

        Err(SimulationError::ModelFitFailure {
            reason: FitFailure::NonConvergence {
                iterations: self.config.max_iterations,
            },
        })
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

/// Logistic model fitted to one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLogistic {
    coefficients: Coefficients,
    iterations: usize,
}

impl FittedLogistic {
    /// Builds a fitted model from known coefficients `[b0, b1, b2]`.
    #[must_use]
    pub fn from_coefficients(coefficients: [f64; N_COEFFICIENTS]) -> Self {
        Self {
            coefficients: Coefficients::from(coefficients),
            iterations: 0,
        }
    }

    /// Coefficients `[intercept, X1, X2]`.
    #[must_use]
    pub fn coefficients(&self) -> [f64; N_COEFFICIENTS] {
        self.coefficients.into()
    }

    /// Newton iterations used by the fit.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl PropensityScorer for FittedLogistic {
    fn score(&self, observation: &Observation) -> f64 {
        logistic(self.coefficients.dot(&design_row(observation)))
    }
}

/// A dataset paired with one propensity score per row.
#[derive(Debug, Clone)]
pub struct ScoredDataset<'a> {
    dataset: &'a Dataset,
    scores: Vec<f64>,
}

impl<'a> ScoredDataset<'a> {
    /// Scores every row of `dataset` with `scorer`.
    #[must_use]
    pub fn from_scorer<S: PropensityScorer>(dataset: &'a Dataset, scorer: &S) -> Self {
        Self {
            dataset,
            scores: scorer.score_all(dataset),
        }
    }

    /// Pairs `dataset` with precomputed scores.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::ScoreLengthMismatch` if the lengths differ.
    pub fn with_scores(dataset: &'a Dataset, scores: Vec<f64>) -> Result<Self> {
        if scores.len() != dataset.len() {
            return Err(SimulationError::ScoreLengthMismatch {
                scores: scores.len(),
                observations: dataset.len(),
            });
        }
        Ok(Self { dataset, scores })
    }

    /// Underlying dataset.
    #[must_use]
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Scores, aligned with the dataset rows.
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{DataGenerator, GeneratorConfig};
    use matchboot_core::Scenario;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dataset_from(rows: &[(bool, f64, f64)]) -> Dataset {
        Dataset::new(
            Scenario::Continuous,
            rows.iter()
                .map(|&(t, x1, x2)| Observation::new(t, 0.0, [x1, x2]))
                .collect(),
        )
    }

    #[test]
    fn recovers_generating_coefficients() {
        let generator = DataGenerator::new(GeneratorConfig::new(50_000));
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let dataset = generator.generate(Scenario::Continuous, &mut rng);

        let fitted = LogisticRegression::default().fit(&dataset).unwrap();
        let [b0, b1, b2] = fitted.coefficients();

        assert!((b0 - 0.5).abs() < 0.05, "intercept was {}", b0);
        assert!((b1 - 0.1).abs() < 0.05, "x1 slope was {}", b1);
        assert!((b2 + 0.2).abs() < 0.06, "x2 slope was {}", b2);
        assert!(fitted.iterations() < 10);
    }

    #[test]
    fn scores_lie_strictly_inside_unit_interval() {
        let generator = DataGenerator::new(GeneratorConfig::new(300));
        let mut rng = ChaCha8Rng::seed_from_u64(22);
        let dataset = generator.generate(Scenario::Continuous, &mut rng);

        let fitted = LogisticRegression::default().fit(&dataset).unwrap();
        assert!(fitted
            .score_all(&dataset)
            .iter()
            .all(|&s| s > 0.0 && s < 1.0));
    }

    #[test]
    fn all_treated_is_degenerate() {
        let dataset = dataset_from(&[(true, 0.1, 0.0), (true, -0.4, 1.0), (true, 1.3, 1.0)]);

        let err = LogisticRegression::default().fit(&dataset).unwrap_err();
        assert_eq!(
            err,
            SimulationError::ModelFitFailure {
                reason: FitFailure::DegenerateResponse {
                    treated: 3,
                    observations: 3
                }
            }
        );
    }

    #[test]
    fn no_treated_is_degenerate() {
        let dataset = dataset_from(&[(false, 0.1, 0.0), (false, -0.4, 1.0)]);

        let err = LogisticRegression::default().fit(&dataset).unwrap_err();
        assert!(err.is_skippable());
    }

    #[test]
    fn empty_dataset_fails() {
        let dataset = Dataset::new(Scenario::Binary, vec![]);

        let err = LogisticRegression::default().fit(&dataset).unwrap_err();
        assert_eq!(err, FitFailure::EmptyDataset.into());
    }

    #[test]
    fn constant_covariate_fails() {
        // X2 never varies, so its column is collinear with the intercept
        let dataset = dataset_from(&[
            (true, 0.3, 1.0),
            (false, -0.2, 1.0),
            (true, -1.1, 1.0),
            (false, 0.8, 1.0),
        ]);

        // Round-off may leave a tiny pivot, so any fit failure is acceptable
        let err = LogisticRegression::default().fit(&dataset).unwrap_err();
        assert!(matches!(err, SimulationError::ModelFitFailure { .. }));
    }

    #[test]
    fn complete_separation_fails() {
        let dataset = dataset_from(&[
            (false, -2.0, 0.0),
            (false, -1.0, 1.0),
            (false, -0.5, 0.0),
            (true, 0.5, 1.0),
            (true, 1.0, 0.0),
            (true, 2.0, 1.0),
        ]);

        let err = LogisticRegression::default().fit(&dataset).unwrap_err();
        assert!(err.is_skippable(), "unexpected error {:?}", err);
    }

    #[test]
    fn fitted_model_scores_with_known_coefficients() {
        let fitted = FittedLogistic::from_coefficients([0.0, 1.0, 0.0]);
        let observation = Observation::new(true, 0.0, [0.0, 1.0]);
        assert!((fitted.score(&observation) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn scored_dataset_checks_lengths() {
        let dataset = dataset_from(&[(true, 0.0, 0.0), (false, 0.0, 1.0)]);

        assert!(ScoredDataset::with_scores(&dataset, vec![0.4, 0.6]).is_ok());
        assert_eq!(
            ScoredDataset::with_scores(&dataset, vec![0.4]).unwrap_err(),
            SimulationError::ScoreLengthMismatch {
                scores: 1,
                observations: 2
            }
        );
    }
}
