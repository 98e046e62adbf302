use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ShowConfigArgs, SimulateArgs};

#[derive(Parser)]
#[command(name = "matchboot")]
#[command(
    about = "Monte Carlo study of bootstrap standard errors for propensity-score matching",
    long_about = None
)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Monte Carlo study and report true variability against both bootstraps
    Simulate(SimulateArgs),
    /// Print the effective configuration after file, environment, and flag overrides
    ShowConfig(ShowConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Simulate(args) => commands::run_simulate(args)?,
        Commands::ShowConfig(args) => commands::run_show_config(args)?,
    }

    Ok(())
}

/// Installs the global subscriber. Reports go to stdout, so logs never do.
fn init_tracing(log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_file_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "matchboot",
            "simulate",
            "--seed",
            "7",
            "--log-file",
            "run.log",
        ])
        .unwrap();

        assert_eq!(cli.log_file.as_deref(), Some("run.log"));
        match cli.command {
            Commands::Simulate(args) => assert_eq!(args.config.seed, Some(7)),
            Commands::ShowConfig(_) => panic!("expected simulate"),
        }
    }

    #[test]
    fn show_config_parses() {
        let cli = Cli::try_parse_from(["matchboot", "show-config", "--format", "json"]).unwrap();

        assert!(matches!(cli.command, Commands::ShowConfig(_)));
    }
}
