pub mod config;
pub mod config_loader;
pub mod error;
pub mod observation;
pub mod traits;

pub use config::{MatchOrder, SimulationConfig};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH, ENV_PREFIX};
pub use error::{FitFailure, Result, SimulationError, SkipCounts};
pub use observation::{Dataset, Observation, OutcomeKind, Scenario, N_COVARIATES};
pub use traits::{PropensityModel, PropensityScorer};
