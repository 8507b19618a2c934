use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use spotfind_core::PeakFinderConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a full default PeakFinderConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let config = PeakFinderConfig::default();
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}

/// Load a PeakFinderConfig from a TOML file.
pub fn load(path: &PathBuf) -> Result<PeakFinderConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: PeakFinderConfig =
        toml::from_str(&contents).context("Invalid peak finder config")?;
    Ok(config)
}
