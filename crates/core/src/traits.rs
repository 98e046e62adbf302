use crate::error::Result;
use crate::observation::{Dataset, Observation};

/// A binary-response model of treatment on covariates.
///
/// Implementations are refitted from scratch on every dataset they see,
/// including each bootstrap resample.
pub trait PropensityModel: Send + Sync {
    /// Fitted model able to score observations.
    type Fitted: PropensityScorer;

    /// Fits the model to `dataset`.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::ModelFitFailure` when the treatment
    /// column is degenerate or the optimisation does not produce a usable fit.
    fn fit(&self, dataset: &Dataset) -> Result<Self::Fitted>;

    /// Short name for logs and reports.
    fn name(&self) -> &str;
}

/// Fitted propensity model.
pub trait PropensityScorer {
    /// Estimated probability of treatment for `observation`, in (0, 1).
    fn score(&self, observation: &Observation) -> f64;

    /// Scores every row of `dataset`, in order.
    fn score_all(&self, dataset: &Dataset) -> Vec<f64> {
        dataset
            .observations()
            .iter()
            .map(|o| self.score(o))
            .collect()
    }
}
