#![cfg_attr(not(test), forbid(unsafe_code))]

//! Command line entry point for The Last Show gateway.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use server::commands::{
    config::{ConfigFormat, print_config},
    spec::generate_spec,
};
use shared::config::server::{Config, Profile};
use std::path::PathBuf;

/// Main CLI structure for the gateway
#[derive(Parser)]
#[command(name = "lastshow")]
#[command(about = "Web gateway for The Last Show obituary service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway
    Serve {
        /// Port to bind, overriding the configuration file and environment
        #[arg(long, short)]
        port: Option<u16>,

        /// Path to a configuration file (`.yaml`, `.yml` or `.json`)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Write the OpenAPI document
    Spec {
        /// `json` or `yaml` for stdout, or a file path; YAML to stdout when omitted
        output: Option<String>,
    },
    /// Print the default configuration
    Config {
        #[arg(long, short, value_enum, default_value_t = ConfigFormat::Yaml)]
        format: ConfigFormat,

        /// Profile whose defaults are printed
        #[arg(long, default_value = "dev")]
        profile: Profile,
    },
}

/// Loads configuration and runs the gateway until shutdown.
///
/// # Errors
/// Returns an error if configuration loading or server startup fails.
pub async fn handle_serve_command(port: Option<u16>, config: Option<PathBuf>) -> anyhow::Result<()> {
    let resolved = Config::load_config(config, port)?;
    server::server::run(resolved).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => handle_serve_command(port, config).await,
        Commands::Spec { output } => generate_spec(output.as_deref()),
        Commands::Config { format, profile } => print_config(profile, format),
    }
}
