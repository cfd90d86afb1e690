// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Daemon mode
//!
//! Startup sequence: load and validate configuration, check process
//! preconditions (privilege, base directory, export table file), wire the
//! provisioning pipeline, serve HTTP until ctrl-c/SIGTERM.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use exportd_core::application::VolumeProvisioner;
use exportd_core::domain::config::HostConfig;
use exportd_core::domain::export::StartupError;
use exportd_core::infrastructure::{ExportfsReloader, ExportsFile, FsDirectoryStore};
use exportd_core::presentation::api::{app, AppState};

#[derive(Args, Default)]
pub struct ServeArgs {
    /// Listen address override (default from config, 0.0.0.0:8000)
    #[arg(long, env = "EXPORTD_LISTEN_ADDR", value_name = "ADDR")]
    pub listen: Option<String>,

    /// Skip the elevated-privilege check (development only; chown is
    /// usually impossible without it)
    #[arg(long)]
    pub allow_unprivileged: bool,
}

pub async fn run(config_path: Option<PathBuf>, args: ServeArgs) -> Result<()> {
    let config = HostConfig::discover(config_path.as_deref())
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    if !args.allow_unprivileged {
        ensure_privileged()?;
    }

    info!(
        base = %config.base_volume_path.display(),
        exports = %config.exports_file.display(),
        "exportd starting"
    );

    // Startup invariants: base directory and export table file.
    let directories = Arc::new(FsDirectoryStore::new(
        &config.base_volume_path,
        config.volume_mode,
        config.owner,
    )?);
    let exports = Arc::new(ExportsFile::new(&config.exports_file)?);
    let reloader = Arc::new(ExportfsReloader::from_config(&config.reload));

    let provisioner = Arc::new(VolumeProvisioner::new(
        &config,
        directories,
        exports,
        reloader,
    ));

    let state = AppState {
        provisioner,
        base_volume_path: config.base_volume_path.clone(),
        start_time: Instant::now(),
    };

    let addr = args.listen.unwrap_or_else(|| config.listen_addr.clone());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("exportd listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("exportd shutting down");

    Ok(())
}

#[cfg(unix)]
fn ensure_privileged() -> Result<()> {
    // SAFETY: geteuid has no failure modes and touches no memory.
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        return Err(StartupError::NotRoot.into());
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_privileged() -> Result<()> {
    Err(StartupError::NotRoot.into())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
