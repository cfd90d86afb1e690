// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Export daemon reloader.
//!
//! Runs `exportfs -r` so the kernel NFS daemon picks up export table
//! changes. This is the one external-process call in the request path, so
//! it gets the one bounded timeout. Any failure is downgraded to a
//! [`ReloadWarning`]: the directory and table entry are already durably in
//! place, and the daemon will catch up on its next refresh.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;

use crate::domain::config::ReloadConfig;
use crate::domain::export::{ExportReloader, ReloadWarning};

pub struct ExportfsReloader {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ExportfsReloader {
    pub fn new() -> Self {
        Self::from_config(&ReloadConfig::default())
    }

    pub fn from_config(config: &ReloadConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_command(
        command: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
        timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }
}

impl Default for ExportfsReloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExportReloader for ExportfsReloader {
    async fn reload(&self) -> Result<(), ReloadWarning> {
        let mut command = tokio::process::Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let status = match tokio::time::timeout(self.timeout, command.status()).await {
            Err(_) => {
                return Err(ReloadWarning::TimedOut {
                    command: self.command.clone(),
                    timeout_secs: self.timeout.as_secs(),
                })
            }
            Ok(Err(e)) => {
                return Err(ReloadWarning::Launch {
                    command: self.command.clone(),
                    reason: e.to_string(),
                })
            }
            Ok(Ok(status)) => status,
        };

        if status.success() {
            Ok(())
        } else {
            Err(ReloadWarning::Exited {
                command: self.command.clone(),
                status: status.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command() {
        let reloader =
            ExportfsReloader::with_command("true", Vec::<String>::new(), Duration::from_secs(5));
        assert!(reloader.reload().await.is_ok());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_warning() {
        let reloader =
            ExportfsReloader::with_command("false", Vec::<String>::new(), Duration::from_secs(5));
        assert!(matches!(
            reloader.reload().await,
            Err(ReloadWarning::Exited { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_command_is_warning() {
        let reloader = ExportfsReloader::with_command(
            "exportd-no-such-binary",
            Vec::<String>::new(),
            Duration::from_secs(5),
        );
        assert!(matches!(
            reloader.reload().await,
            Err(ReloadWarning::Launch { .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_command_times_out() {
        let reloader =
            ExportfsReloader::with_command("sleep", ["5"], Duration::from_millis(100));
        assert!(matches!(
            reloader.reload().await,
            Err(ReloadWarning::TimedOut { .. })
        ));
    }
}
