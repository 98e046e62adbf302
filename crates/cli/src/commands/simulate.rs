//! Simulate CLI command.
//!
//! Runs the Monte Carlo study for every configured scenario and reports the
//! true sampling variability of the matched estimate next to the simple and
//! complex bootstrap standard errors.

use anyhow::Result;
use clap::Args;

use matchboot_simulation::{BootstrapSummary, MonteCarloHarness, ScenarioReport, SimulationReport};

use super::{ConfigArgs, OutputFormat};

/// Arguments for the simulate command.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Output JSON results to file
    #[arg(long)]
    pub output: Option<String>,
}

/// Formats the study results as a text report.
fn format_text_report(report: &SimulationReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("===============================================================\n");
    output.push_str("            MATCHED ESTIMATOR BOOTSTRAP STUDY                  \n");
    output.push_str("===============================================================\n");
    output.push_str(&format!("Seed: {}\n", report.seed));

    for scenario in &report.scenarios {
        output.push_str(&format_scenario(scenario));
    }

    output.push_str("===============================================================\n");
    output
}

fn format_scenario(report: &ScenarioReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("---------------------------------------------------------------\n");
    output.push_str(&format!(
        "SCENARIO: {}\n",
        report.scenario.as_str().to_uppercase()
    ));
    output.push_str("---------------------------------------------------------------\n");
    output.push_str(&format!(
        "  Sample size: {}   Simulations: {}   Replications: {}\n",
        report.sample_size, report.n_simulations, report.n_replications
    ));
    output.push_str(&format!("  Match order: {}\n", report.match_order));
    output.push('\n');

    let truth = &report.truth;
    output.push_str("TRUE VARIABILITY\n");
    output.push_str(&format!(
        "  Std dev of effect:  {:.5}\n",
        truth.standard_deviation
    ));
    output.push_str(&format!("  Mean effect:        {:.5}\n", truth.mean_effect));
    output.push_str(&format!(
        "  Effect range:       [{:.5}, {:.5}]\n",
        truth.distribution.min, truth.distribution.max
    ));
    output.push_str(&format!(
        "  Simulations used:   {} (skipped: {} fit, {} empty)\n",
        truth.simulations_used, truth.skipped.model_fit_failures, truth.skipped.empty_groups
    ));
    output.push('\n');

    output.push_str("REALIZED DATASET\n");
    output.push_str(&format!("  Effect estimate:    {:.5}\n", report.realized_effect));
    output.push_str(&format!(
        "  Matched pairs:      {} ({} treated unmatched)\n",
        report.realized_pairs, report.realized_unmatched_treated
    ));
    output.push('\n');

    output.push_str("BOOTSTRAP STANDARD ERRORS\n");
    output.push_str("  Method      SE         Rel. error   CI                     Used\n");
    output.push_str(&format_bootstrap_row(
        "Simple",
        &report.simple_bootstrap,
        report.simple_relative_error(),
    ));
    output.push_str(&format_bootstrap_row(
        "Complex",
        &report.complex_bootstrap,
        report.complex_relative_error(),
    ));
    output.push('\n');

    let closer = if report.complex_tracks_truth_better() {
        "complex"
    } else {
        "simple"
    };
    output.push_str(&format!("  Closer to true variability: {}\n", closer));

    output
}

fn format_bootstrap_row(label: &str, summary: &BootstrapSummary, relative_error: f64) -> String {
    format!(
        "  {:<10}  {:<9.5}  {:>+9.1}%   [{:>8.4}, {:>8.4}]   {}/{}\n",
        label,
        summary.standard_error,
        relative_error * 100.0,
        summary.ci_lower,
        summary.ci_upper,
        summary.replications_used,
        summary.replications_requested
    )
}

/// Runs the simulate command.
pub fn run_simulate(args: SimulateArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let config = args.config.resolve()?;

    tracing::info!(
        sample_size = config.sample_size,
        n_simulations = config.n_simulations,
        n_replications = config.n_replications,
        noise_sd = config.noise_sd,
        match_order = %config.match_order,
        parallel = config.parallel,
        "resolved configuration"
    );

    let harness = MonteCarloHarness::new(config)?;
    let report = harness.run()?;

    tracing::info!(
        seed = report.seed,
        scenarios = report.scenarios.len(),
        "study complete"
    );

    match format {
        OutputFormat::Text => {
            println!("{}", format_text_report(&report));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if let Some(output_path) = args.output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&output_path, json)?;
        tracing::info!("Results written to {}", output_path);
    }

    Ok(())
}
