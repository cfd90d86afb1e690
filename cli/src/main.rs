// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # exportd NFS Volume Host CLI
//!
//! The `exportd` binary runs the directory-backed NFS volume provisioning
//! daemon and manages its configuration.
//!
//! ## Commands
//!
//! - `exportd serve` - Run the provisioning daemon (default when no
//!   command is given)
//! - `exportd config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{config::ConfigCommand, serve::ServeArgs};

/// exportd - provision directory-backed NFS export volumes
#[derive(Parser)]
#[command(name = "exportd")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "EXPORTD_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "EXPORTD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the provisioning daemon
    Serve(ServeArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level)?;

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::run(cli.config, args).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        // Bare `exportd` runs the daemon with defaults.
        None => commands::serve::run(cli.config, ServeArgs::default()).await,
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("invalid log level: {log_level}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}
