// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Export port traits.
//!
//! The provisioning pipeline touches exactly two pieces of durable state
//! (the volume directory tree and the export table file) and one external
//! process (the export daemon). These traits isolate the pipeline from the
//! concrete filesystem and process plumbing, and let tests substitute
//! in-memory or failing implementations.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Owns the on-disk directory tree under the base volume path.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Make `path` exist as an empty directory with the fixed owner and
    /// permission bits, discarding any prior contents.
    async fn ensure_clean(&self, path: &Path) -> Result<(), ExportError>;
}

/// Owns the export table file.
///
/// The table is a line-oriented record, one `"<path> <options>"` line per
/// exported directory. It is append-only from this system's perspective:
/// lines are never rewritten or removed, and unmanaged lines are preserved
/// untouched.
#[async_trait]
pub trait ExportTable: Send + Sync {
    /// Whether the table already has an entry for `path`.
    ///
    /// Matching is exact on the first whitespace-delimited field of each
    /// line, so an exported path never masks a longer path it is a prefix
    /// of.
    async fn contains(&self, path: &Path) -> Result<bool, ExportError>;

    /// Append an entry for `path` unconditionally.
    async fn append(&self, path: &Path) -> Result<(), ExportError>;

    /// Append an entry for `path` unless one exists, atomically with
    /// respect to other `ensure` calls. Returns whether a line was written.
    async fn ensure(&self, path: &Path) -> Result<bool, ExportError>;
}

/// Signals the export daemon to pick up table changes.
#[async_trait]
pub trait ExportReloader: Send + Sync {
    /// Best effort: a failure here never fails the request, because the
    /// directory and the table entry are already durably in place.
    async fn reload(&self) -> Result<(), ReloadWarning>;
}

/// A directory or export-table operation failed. Not retried.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The export daemon reload did not go through.
///
/// Carried alongside the success result so callers and observability can
/// surface it; the exports will apply on the daemon's next refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReloadWarning {
    #[error("export reload command {command:?} failed to launch: {reason}")]
    Launch { command: String, reason: String },

    #[error("export reload command {command:?} exited with {status}")]
    Exited { command: String, status: String },

    #[error("export reload command {command:?} timed out after {timeout_secs}s")]
    TimedOut { command: String, timeout_secs: u64 },
}

/// A process precondition failed before the service could start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("base volume path {0} exists but is not a directory")]
    BaseNotADirectory(PathBuf),

    #[error("failed to prepare base volume path {path}: {source}")]
    BasePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export table file {path} is missing or unreadable: {source}")]
    ExportsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("must run with elevated privilege (euid 0); pass --allow-unprivileged to override")]
    NotRoot,
}
