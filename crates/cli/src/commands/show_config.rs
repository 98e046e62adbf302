//! Show-config CLI command.
//!
//! Prints the configuration a `simulate` run with the same flags would use.
//! The text form is valid TOML and can be saved as a config file.

use anyhow::Result;
use clap::Args;

use matchboot_core::SimulationConfig;

use super::{ConfigArgs, OutputFormat};

/// Arguments for the show-config command.
#[derive(Args, Debug, Clone)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Renders `config` as TOML. An unset seed is omitted.
fn format_config_text(config: &SimulationConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

/// Runs the show-config command.
pub fn run_show_config(args: ShowConfigArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let config = args.config.resolve()?;

    match format {
        OutputFormat::Text => print!("{}", format_config_text(&config)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }

    Ok(())
}
