// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Export table file adapter.
//!
//! Manages `/etc/exports` (or a configured stand-in): one
//! `"<path> *(rw)"` line per exported volume directory. The file is shared
//! durable state between concurrent requests, so the check-then-append
//! sequence runs under an internal mutex; without it, two first-time
//! requests for the same path could both observe "absent" and both append.
//!
//! The adapter only ever appends. Existing lines, including ones written by
//! an operator for unrelated exports, are never rewritten or removed.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::export::{ExportError, ExportTable, StartupError};

const EXPORT_OPTIONS: &str = "*(rw)";

pub struct ExportsFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ExportsFile {
    /// Open the export table, enforcing the must-exist-and-be-readable
    /// precondition once at startup.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StartupError> {
        let path = path.into();
        std::fs::read_to_string(&path).map_err(|source| StartupError::ExportsFile {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_contains(&self, path: &Path) -> Result<bool, ExportError> {
        let table = std::fs::read_to_string(&self.path)
            .map_err(|e| ExportError::io(&self.path, e))?;
        let needle = path.to_string_lossy();
        Ok(table
            .lines()
            .any(|line| line.split_whitespace().next() == Some(needle.as_ref())))
    }

    fn append_line(&self, path: &Path) -> Result<(), ExportError> {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| ExportError::io(&self.path, e))?;
        writeln!(file, "{} {}", path.display(), EXPORT_OPTIONS)
            .map_err(|e| ExportError::io(&self.path, e))?;
        Ok(())
    }
}

#[async_trait]
impl ExportTable for ExportsFile {
    async fn contains(&self, path: &Path) -> Result<bool, ExportError> {
        let _guard = self.lock.lock().await;
        self.read_contains(path)
    }

    async fn append(&self, path: &Path) -> Result<(), ExportError> {
        let _guard = self.lock.lock().await;
        self.append_line(path)
    }

    async fn ensure(&self, path: &Path) -> Result<bool, ExportError> {
        let _guard = self.lock.lock().await;
        if self.read_contains(path)? {
            debug!(path = %path.display(), exports = %self.path.display(), "path already exported");
            return Ok(false);
        }
        self.append_line(path)?;
        info!(path = %path.display(), exports = %self.path.display(), "export entry appended");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn exports_in(temp: &TempDir) -> ExportsFile {
        let path = temp.path().join("exports");
        std::fs::write(&path, "").unwrap();
        ExportsFile::new(path).unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_is_startup_fatal() {
        let temp = TempDir::new().unwrap();
        let result = ExportsFile::new(temp.path().join("exports"));
        assert!(matches!(result, Err(StartupError::ExportsFile { .. })));
    }

    #[tokio::test]
    async fn test_contains_after_append() {
        let temp = TempDir::new().unwrap();
        let exports = exports_in(&temp);
        let path = Path::new("/nfs/volumes/data1");

        assert!(!exports.contains(path).await.unwrap());
        assert!(exports.ensure(path).await.unwrap());
        assert!(exports.contains(path).await.unwrap());

        let table = std::fs::read_to_string(exports.path()).unwrap();
        assert_eq!(table, "/nfs/volumes/data1 *(rw)\n");
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let exports = exports_in(&temp);
        let path = Path::new("/nfs/volumes/data1");

        assert!(exports.ensure(path).await.unwrap());
        assert!(!exports.ensure(path).await.unwrap());

        let table = std::fs::read_to_string(exports.path()).unwrap();
        assert_eq!(table.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_exact_field_match_not_prefix() {
        let temp = TempDir::new().unwrap();
        let exports = exports_in(&temp);

        exports.ensure(Path::new("/nfs/volumes/data1")).await.unwrap();

        // A shorter path that is a prefix of an exported one is still absent.
        assert!(!exports.contains(Path::new("/nfs/volumes/data")).await.unwrap());
        assert!(exports.ensure(Path::new("/nfs/volumes/data")).await.unwrap());

        let table = std::fs::read_to_string(exports.path()).unwrap();
        assert_eq!(table.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_foreign_lines_preserved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("exports");
        std::fs::write(&path, "/srv/media 192.168.0.0/24(ro,sync)\n").unwrap();
        let exports = ExportsFile::new(&path).unwrap();

        exports.ensure(Path::new("/nfs/volumes/data1")).await.unwrap();

        let table = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            table,
            "/srv/media 192.168.0.0/24(ro,sync)\n/nfs/volumes/data1 *(rw)\n"
        );
    }

    #[tokio::test]
    async fn test_concurrent_ensure_writes_one_line() {
        let temp = TempDir::new().unwrap();
        let exports = Arc::new(exports_in(&temp));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let exports = exports.clone();
            handles.push(tokio::spawn(async move {
                exports.ensure(Path::new("/nfs/volumes/data2")).await.unwrap()
            }));
        }

        let mut appended = 0;
        for handle in handles {
            if handle.await.unwrap() {
                appended += 1;
            }
        }

        assert_eq!(appended, 1);
        let table = std::fs::read_to_string(exports.path()).unwrap();
        assert_eq!(table.lines().count(), 1);
    }
}
