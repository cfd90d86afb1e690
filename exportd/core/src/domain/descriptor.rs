// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! PersistentVolume descriptor.
//!
//! The serialized projection of a provisioned volume that is handed back to
//! the cluster orchestrator. It is built fresh on every request and never
//! stored; field names follow the Kubernetes `PersistentVolume` manifest.

use serde::{Deserialize, Serialize};

use crate::domain::volume::Volume;

/// Top-level Kubernetes-style persistent volume manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentVolume {
    /// API version (always "v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (always "PersistentVolume")
    pub kind: String,

    pub metadata: Metadata,

    pub spec: VolumeSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {
    pub capacity: Capacity,

    #[serde(rename = "accessModes")]
    pub access_modes: Vec<String>,

    pub nfs: NfsSource,

    #[serde(rename = "persistentVolumeReclaimPolicy")]
    pub reclaim_policy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    /// Requested size, e.g. "2Gi"
    pub storage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfsSource {
    /// Exported directory on the volume host
    pub path: String,
    /// Address NFS clients mount from
    pub server: String,
}

impl PersistentVolume {
    /// Project a provisioned volume into its descriptor.
    pub fn for_volume(volume: &Volume, server: impl Into<String>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "PersistentVolume".to_string(),
            metadata: Metadata {
                name: volume.name.to_string(),
            },
            spec: VolumeSpec {
                capacity: Capacity {
                    storage: volume.capacity.clone(),
                },
                access_modes: vec![volume.access_mode.as_str().to_string()],
                nfs: NfsSource {
                    path: volume.path.to_string_lossy().into_owned(),
                    server: server.into(),
                },
                reclaim_policy: volume.reclaim_policy.clone(),
            },
        }
    }
}

/// Strip the `:port` suffix from an HTTP request host.
///
/// Clients mount from the address they reached us on, minus the API port.
pub fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}
