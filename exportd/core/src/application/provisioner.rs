// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Volume Provisioner Application Service
//!
//! Orchestrates one request's pass over the two pieces of durable state:
//! ensure a clean volume directory, ensure an export table entry, then ask
//! the export daemon to reload. The steps run in that fixed order and
//! nothing is rolled back on a later step's failure; the returned error
//! names the step that failed so an operator can reconcile directory vs.
//! export-table state by hand.
//!
//! Concurrent requests for the same name are serialized through a per-name
//! lock registry, so one request's wipe cannot interleave with another's
//! recreate. The export table additionally serializes its own
//! check-then-append internally.

use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::config::HostConfig;
use crate::domain::descriptor::{strip_port, PersistentVolume};
use crate::domain::export::{DirectoryStore, ExportError, ExportReloader, ExportTable, ReloadWarning};
use crate::domain::volume::{AccessMode, Volume, VolumeName, VolumeNameError, VolumeOwner};
use thiserror::Error;

/// Outcome of a successful provision.
///
/// The reload warning rides alongside the descriptor rather than replacing
/// it: by the time the reload runs, the directory and export entry are
/// already committed.
#[derive(Debug)]
pub struct Provisioned {
    pub volume: Volume,
    pub descriptor: PersistentVolume,
    /// Whether this request appended a new export line (false when the
    /// path was already exported by an earlier provision).
    pub exported: bool,
    pub reload_warning: Option<ReloadWarning>,
}

#[async_trait]
pub trait ProvisionService: Send + Sync {
    /// Provision the named volume and build its descriptor.
    ///
    /// `request_host` is the HTTP Host the client reached us on; its port
    /// is stripped to form the NFS server address in the descriptor.
    async fn provision(
        &self,
        name: &str,
        request_host: &str,
    ) -> Result<Provisioned, ProvisionError>;
}

pub struct VolumeProvisioner {
    base: PathBuf,
    owner: Option<VolumeOwner>,
    mode: u32,
    capacity: String,
    reclaim_policy: String,
    directories: Arc<dyn DirectoryStore>,
    exports: Arc<dyn ExportTable>,
    reloader: Arc<dyn ExportReloader>,
    name_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl VolumeProvisioner {
    pub fn new(
        config: &HostConfig,
        directories: Arc<dyn DirectoryStore>,
        exports: Arc<dyn ExportTable>,
        reloader: Arc<dyn ExportReloader>,
    ) -> Self {
        Self {
            base: config.base_volume_path.clone(),
            owner: config.owner,
            mode: config.volume_mode,
            capacity: config.capacity.clone(),
            reclaim_policy: config.reclaim_policy.clone(),
            directories,
            exports,
            reloader,
            name_locks: DashMap::new(),
        }
    }

    pub fn base_volume_path(&self) -> &Path {
        &self.base
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        self.name_locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl ProvisionService for VolumeProvisioner {
    async fn provision(
        &self,
        name: &str,
        request_host: &str,
    ) -> Result<Provisioned, ProvisionError> {
        // Step 1: validate before any side effect.
        let name = VolumeName::parse(name)?;
        let path = self.base.join(name.as_str());

        info!(volume = %name, path = %path.display(), "provisioning volume");

        let lock = self.lock_for(name.as_str());
        let _guard = lock.lock().await;

        // Step 2: clean directory.
        self.directories
            .ensure_clean(&path)
            .await
            .map_err(|source| ProvisionError::Directory {
                path: path.clone(),
                source,
            })?;

        // Step 3: export table entry.
        let exported = self
            .exports
            .ensure(&path)
            .await
            .map_err(|source| ProvisionError::Export {
                path: path.clone(),
                source,
            })?;

        // Step 4: best-effort daemon reload.
        let reload_warning = match self.reloader.reload().await {
            Ok(()) => None,
            Err(warning) => {
                warn!(volume = %name, %warning, "export daemon reload failed, exports apply on next refresh");
                Some(warning)
            }
        };

        let volume = Volume {
            name,
            path,
            owner: self.owner,
            mode: self.mode,
            capacity: self.capacity.clone(),
            access_mode: AccessMode::ReadWriteOnce,
            reclaim_policy: self.reclaim_policy.clone(),
        };
        let descriptor = PersistentVolume::for_volume(&volume, strip_port(request_host));

        Ok(Provisioned {
            volume,
            descriptor,
            exported,
            reload_warning,
        })
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid volume name: {0}")]
    InvalidName(#[from] VolumeNameError),

    #[error("volume directory step failed for {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: ExportError,
    },

    #[error("export table step failed for {path} (volume directory was already created, reconcile manually): {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: ExportError,
    },
}
