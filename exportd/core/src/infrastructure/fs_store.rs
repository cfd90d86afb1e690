// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Filesystem directory store.
//!
//! Owns the directory tree under the base volume path. Every provision
//! hands back an empty directory: an existing volume directory is wiped
//! and recreated, and the fixed mode/owner are re-applied, so stale
//! contents never leak into a new claim.
//!
//! Filesystem calls are blocking `std::fs` operations made directly inside
//! the async methods; changes are immediately visible to other processes,
//! notably the NFS export daemon.

use async_trait::async_trait;
use std::io;
use std::os::unix::fs::{chown, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::export::{DirectoryStore, ExportError, StartupError};
use crate::domain::volume::VolumeOwner;

pub struct FsDirectoryStore {
    base: PathBuf,
    mode: u32,
    owner: Option<VolumeOwner>,
}

impl FsDirectoryStore {
    /// Create the store, enforcing the base-path precondition once.
    ///
    /// The base directory must exist (or be creatable) and must be a
    /// directory; a file squatting on the base path is a fatal
    /// configuration error, not a per-request one.
    pub fn new(
        base: impl Into<PathBuf>,
        mode: u32,
        owner: Option<VolumeOwner>,
    ) -> Result<Self, StartupError> {
        let base = base.into();
        let store = Self { base, mode, owner };

        match std::fs::metadata(&store.base) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StartupError::BaseNotADirectory(store.base.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                std::fs::create_dir_all(&store.base)
                    .and_then(|_| store.apply_attributes(&store.base))
                    .map_err(|source| StartupError::BasePath {
                        path: store.base.clone(),
                        source,
                    })?;
            }
            Err(source) => {
                return Err(StartupError::BasePath {
                    path: store.base.clone(),
                    source,
                })
            }
        }

        Ok(store)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn apply_attributes(&self, path: &Path) -> io::Result<()> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(self.mode))?;
        if let Some(owner) = self.owner {
            chown(path, Some(owner.uid), Some(owner.gid))?;
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for FsDirectoryStore {
    async fn ensure_clean(&self, path: &Path) -> Result<(), ExportError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                debug!(path = %path.display(), "volume directory exists, discarding contents");
                std::fs::remove_dir_all(path).map_err(|e| ExportError::io(path, e))?;
            }
            Ok(_) => {
                return Err(ExportError::io(
                    path,
                    io::Error::new(
                        io::ErrorKind::NotADirectory,
                        "volume path exists but is not a directory",
                    ),
                ));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ExportError::io(path, e)),
        }

        std::fs::create_dir_all(path).map_err(|e| ExportError::io(path, e))?;
        self.apply_attributes(path)
            .map_err(|e| ExportError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> FsDirectoryStore {
        FsDirectoryStore::new(temp.path().join("volumes"), 0o777, None).unwrap()
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let path = store.base().join("data1");
        store.ensure_clean(&path).await.unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.permissions().mode() & 0o777, 0o777);
    }

    #[tokio::test]
    async fn test_wipes_existing_contents() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let path = store.base().join("data1");
        store.ensure_clean(&path).await.unwrap();
        std::fs::write(path.join("stale.txt"), b"left over").unwrap();
        std::fs::create_dir(path.join("nested")).unwrap();

        store.ensure_clean(&path).await.unwrap();

        assert!(path.is_dir());
        assert_eq!(std::fs::read_dir(&path).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_non_directory_collision_is_io_failure() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let path = store.base().join("data1");
        std::fs::write(&path, b"i am a file").unwrap();

        let result = store.ensure_clean(&path).await;
        assert!(matches!(result, Err(ExportError::Io { .. })));
        // The collision is reported, not silently clobbered.
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_base_file_collision_is_startup_fatal() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("volumes");
        std::fs::write(&base, b"not a directory").unwrap();

        let result = FsDirectoryStore::new(&base, 0o777, None);
        assert!(matches!(result, Err(StartupError::BaseNotADirectory(_))));
    }

    #[tokio::test]
    async fn test_base_created_on_first_start() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("a/b/volumes");

        let store = FsDirectoryStore::new(&base, 0o755, None).unwrap();
        let meta = std::fs::metadata(store.base()).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.permissions().mode() & 0o777, 0o755);
    }
}
