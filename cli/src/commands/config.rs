// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use exportd_core::domain::config::HostConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./exportd.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(output),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = HostConfig::discover(config_override.as_deref())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!("  2. ./exportd.yaml");
        println!("  3. /etc/exportd/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Volume host:".bold());
    println!("  Base volume path: {}", config.base_volume_path.display());
    println!("  Export table:     {}", config.exports_file.display());
    println!("  Listen address:   {}", config.listen_addr);
    match config.owner {
        Some(owner) => println!("  Directory owner:  {}:{}", owner.uid, owner.gid),
        None => println!("  Directory owner:  {}", "(chown disabled)".dimmed()),
    }
    println!("  Directory mode:   {:04o}", config.volume_mode);
    println!();

    println!("{}", "Descriptor defaults:".bold());
    println!("  Capacity:       {}", config.capacity);
    println!("  Reclaim policy: {}", config.reclaim_policy);
    println!();

    println!("{}", "Export daemon reload:".bold());
    println!(
        "  Command: {} {}",
        config.reload.command,
        config.reload.args.join(" ")
    );
    println!("  Timeout: {}s", config.reload.timeout_secs);

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = HostConfig::discover(config_path.as_deref())
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "Configuration is valid".green());
    Ok(())
}

fn generate(output: PathBuf) -> Result<()> {
    let config = HostConfig::default();
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;

    std::fs::write(&output, yaml)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Sample configuration written to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_sample_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("exportd.yaml");

        generate(output.clone()).unwrap();

        let config = HostConfig::load(&output).unwrap();
        config.validate().unwrap();
        assert_eq!(config.capacity, "2Gi");
    }
}
