//! CLI commands for the bootstrap Monte Carlo study.

pub mod show_config;
pub mod simulate;

pub use show_config::{run_show_config, ShowConfigArgs};
pub use simulate::{run_simulate, SimulateArgs};

use anyhow::{anyhow, Result};
use clap::Args;

use matchboot_core::{ConfigLoader, MatchOrder, Scenario, SimulationConfig, DEFAULT_CONFIG_PATH};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!(
                "Unknown format: '{}'. Valid formats: text, json",
                s
            )),
        }
    }
}

/// Flags that locate and override the simulation configuration.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Config file path (missing files fall back to defaults)
    #[arg(short, long, env = "MATCHBOOT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Scenarios to run: continuous, binary, or all (comma separated)
    #[arg(long)]
    pub scenario: Option<String>,

    /// Observations per simulated dataset
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Independent datasets used to measure true variability
    #[arg(long)]
    pub simulations: Option<usize>,

    /// Replicates per bootstrap
    #[arg(long)]
    pub replications: Option<usize>,

    /// Root seed; omit for a fresh seed that is reported with the results
    #[arg(long)]
    pub seed: Option<u64>,

    /// Standard deviation of the continuous outcome noise
    #[arg(long)]
    pub noise_sd: Option<f64>,

    /// Order treated units are matched in: dataset, shuffled
    #[arg(long)]
    pub match_order: Option<String>,

    /// Run simulations and bootstrap replicates on all cores
    #[arg(long)]
    pub parallel: bool,
}

impl ConfigArgs {
    /// Loads the configuration file and applies flag overrides on top.
    pub fn resolve(&self) -> Result<SimulationConfig> {
        let config = ConfigLoader::load_from(&self.config)?;
        let config = self.apply(config)?;
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, mut config: SimulationConfig) -> Result<SimulationConfig> {
        if let Some(scenario) = &self.scenario {
            config.scenarios = parse_scenarios(scenario)?;
        }
        if let Some(sample_size) = self.sample_size {
            config.sample_size = sample_size;
        }
        if let Some(simulations) = self.simulations {
            config.n_simulations = simulations;
        }
        if let Some(replications) = self.replications {
            config.n_replications = replications;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(noise_sd) = self.noise_sd {
            config.noise_sd = noise_sd;
        }
        if let Some(order) = &self.match_order {
            config.match_order = order.parse::<MatchOrder>().map_err(|e| anyhow!(e))?;
        }
        if self.parallel {
            config.parallel = true;
        }
        Ok(config)
    }
}

/// Parses `all` or a comma-separated scenario list, dropping repeats.
fn parse_scenarios(s: &str) -> Result<Vec<Scenario>> {
    if s.trim().eq_ignore_ascii_case("all") {
        return Ok(Scenario::ALL.to_vec());
    }

    let mut scenarios = Vec::new();
    for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let scenario = name.parse::<Scenario>().map_err(|e| anyhow!(e))?;
        if !scenarios.contains(&scenario) {
            scenarios.push(scenario);
        }
    }

    if scenarios.is_empty() {
        return Err(anyhow!("No scenarios given. Valid scenarios: continuous, binary, all"));
    }
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ConfigArgs,
    }

    fn args(flags: &[&str]) -> ConfigArgs {
        let mut argv = vec!["test"];
        argv.extend_from_slice(flags);
        TestCli::parse_from(argv).args
    }

    // ============================================
    // OutputFormat Tests
    // ============================================

    #[test]
    fn output_format_parses_text_variants() {
        assert_eq!(OutputFormat::parse("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("TXT").unwrap(), OutputFormat::Text);
    }

    #[test]
    fn output_format_parses_json() {
        assert_eq!(OutputFormat::parse("Json").unwrap(), OutputFormat::Json);
    }

    #[test]
    fn output_format_rejects_unknown() {
        assert!(OutputFormat::parse("csv").is_err());
        assert!(OutputFormat::parse("").is_err());
    }

    // ============================================
    // Scenario Parsing Tests
    // ============================================

    #[test]
    fn parse_scenarios_accepts_all() {
        assert_eq!(parse_scenarios("ALL").unwrap(), Scenario::ALL.to_vec());
    }

    #[test]
    fn parse_scenarios_keeps_order_and_drops_repeats() {
        assert_eq!(
            parse_scenarios("binary, continuous,binary").unwrap(),
            vec![Scenario::Binary, Scenario::Continuous]
        );
    }

    #[test]
    fn parse_scenarios_rejects_unknown_and_empty() {
        assert!(parse_scenarios("survival").is_err());
        assert!(parse_scenarios(" , ").is_err());
    }

    // ============================================
    // Override Tests
    // ============================================

    #[test]
    fn flags_override_loaded_values() {
        let overrides = args(&[
            "--scenario",
            "binary",
            "--sample-size",
            "300",
            "--simulations",
            "40",
            "--replications",
            "50",
            "--seed",
            "9",
            "--noise-sd",
            "2.5",
            "--match-order",
            "shuffled",
            "--parallel",
        ]);

        let config = overrides.apply(SimulationConfig::default()).unwrap();

        assert_eq!(config.scenarios, vec![Scenario::Binary]);
        assert_eq!(config.sample_size, 300);
        assert_eq!(config.n_simulations, 40);
        assert_eq!(config.n_replications, 50);
        assert_eq!(config.seed, Some(9));
        assert!((config.noise_sd - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.match_order, MatchOrder::Shuffled);
        assert!(config.parallel);
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let base = SimulationConfig::new(250, 30, 30).with_seed(4);

        let config = args(&[]).apply(base.clone()).unwrap();

        assert_eq!(config, base);
    }

    #[test]
    fn invalid_override_is_rejected_on_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let mut overrides = args(&["--sample-size", "0"]);
        overrides.config = missing.display().to_string();

        assert!(overrides.resolve().is_err());
    }

    #[test]
    fn bad_match_order_is_an_error() {
        let overrides = args(&["--match-order", "optimal"]);

        assert!(overrides.apply(SimulationConfig::default()).is_err());
    }
}
