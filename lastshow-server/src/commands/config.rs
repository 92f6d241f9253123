//! Prints the effective default configuration.

use std::io::{self, Write};

use clap::ValueEnum;
use shared::config::server::{Config, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Json,
}

/// Renders the defaults for `profile` in the requested format.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_config(profile: Profile, format: ConfigFormat) -> anyhow::Result<String> {
    let config = Config::default_for_profile(profile);
    let rendered = match format {
        ConfigFormat::Yaml => serde_yml::to_string(&config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
    };
    Ok(rendered)
}

/// Writes the defaults for `profile` to stdout.
///
/// # Errors
/// Returns an error if serialization or writing fails.
pub fn print_config(profile: Profile, format: ConfigFormat) -> anyhow::Result<()> {
    let rendered = render_config(profile, format)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    if !rendered.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
