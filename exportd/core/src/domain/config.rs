// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Host configuration.
//!
//! YAML configuration for a volume host node. Every field has a default
//! matching the classic deployment (`/nfs/volumes`, `/etc/exports`,
//! `exportfs -r`, port 8000), so the daemon runs with no config file at
//! all. Discovery order:
//!
//! 1. `--config` flag / `EXPORTD_CONFIG_PATH`
//! 2. `./exportd.yaml`
//! 3. `/etc/exportd/config.yaml`

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::volume::VolumeOwner;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory volumes are created under. One subdirectory per volume.
    pub base_volume_path: PathBuf,

    /// Export table file consulted by the NFS daemon.
    pub exports_file: PathBuf,

    /// Address the HTTP API binds to.
    pub listen_addr: String,

    /// Owner applied to volume directories. `null` skips chown so the
    /// daemon can run unprivileged in development.
    pub owner: Option<VolumeOwner>,

    /// Permission bits applied to volume directories, as an octal string.
    #[serde(with = "mode_octal")]
    pub volume_mode: u32,

    /// Capacity advertised in returned descriptors.
    pub capacity: String,

    /// Reclaim policy advertised in returned descriptors.
    pub reclaim_policy: String,

    pub reload: ReloadConfig,
}

/// Export daemon reload invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Bound on the one external-process call in the request path.
    pub timeout_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_volume_path: PathBuf::from("/nfs/volumes"),
            exports_file: PathBuf::from("/etc/exports"),
            listen_addr: "0.0.0.0:8000".to_string(),
            owner: Some(VolumeOwner::nobody()),
            volume_mode: 0o777,
            capacity: "2Gi".to_string(),
            reclaim_policy: "Recycle".to_string(),
            reload: ReloadConfig::default(),
        }
    }
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            command: "exportfs".to_string(),
            args: vec!["-r".to_string()],
            timeout_secs: 10,
        }
    }
}

impl HostConfig {
    /// Load configuration from an explicit path, or walk the discovery
    /// candidates, or fall back to defaults when nothing is found.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        for candidate in ["./exportd.yaml", "/etc/exportd/config.yaml"] {
            let candidate = Path::new(candidate);
            if candidate.exists() {
                return Self::load(candidate);
            }
        }
        Ok(Self::default())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_volume_path.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "base_volume_path {} must be absolute",
                self.base_volume_path.display()
            )));
        }
        if !self.exports_file.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "exports_file {} must be absolute",
                self.exports_file.display()
            )));
        }
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid(format!("listen_addr {}: {}", self.listen_addr, e)))?;
        if self.capacity.is_empty() {
            return Err(ConfigError::Invalid("capacity must not be empty".into()));
        }
        if self.reclaim_policy.is_empty() {
            return Err(ConfigError::Invalid(
                "reclaim_policy must not be empty".into(),
            ));
        }
        if self.reload.command.is_empty() {
            return Err(ConfigError::Invalid(
                "reload.command must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Octal-string serialization for permission bits ("0777" in YAML).
mod mode_octal {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(mode: &u32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:04o}", mode))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let digits = raw.trim_start_matches("0o");
        u32::from_str_radix(digits, 8)
            .map_err(|_| serde::de::Error::custom(format!("invalid octal mode: {raw}")))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_deployment() {
        let config = HostConfig::default();
        assert_eq!(config.base_volume_path, PathBuf::from("/nfs/volumes"));
        assert_eq!(config.exports_file, PathBuf::from("/etc/exports"));
        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.owner, Some(VolumeOwner::nobody()));
        assert_eq!(config.volume_mode, 0o777);
        assert_eq!(config.capacity, "2Gi");
        assert_eq!(config.reclaim_policy, "Recycle");
        assert_eq!(config.reload.command, "exportfs");
        assert_eq!(config.reload.args, vec!["-r"]);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: HostConfig =
            serde_yaml::from_str("base_volume_path: /srv/volumes\nvolume_mode: \"0755\"\n")
                .unwrap();
        assert_eq!(config.base_volume_path, PathBuf::from("/srv/volumes"));
        assert_eq!(config.volume_mode, 0o755);
        assert_eq!(config.exports_file, PathBuf::from("/etc/exports"));
    }

    #[test]
    fn test_owner_null_disables_chown() {
        let config: HostConfig = serde_yaml::from_str("owner: null\n").unwrap();
        assert_eq!(config.owner, None);
    }

    #[test]
    fn test_mode_round_trips_as_octal_string() {
        let yaml = serde_yaml::to_string(&HostConfig::default()).unwrap();
        assert!(yaml.contains("volume_mode: '0777'") || yaml.contains("volume_mode: \"0777\""));
        let parsed: HostConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.volume_mode, 0o777);
    }

    #[test]
    fn test_validate_rejects_relative_base_path() {
        let config = HostConfig {
            base_volume_path: PathBuf::from("volumes"),
            ..HostConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_listen_addr() {
        let config = HostConfig {
            listen_addr: "not-an-addr".to_string(),
            ..HostConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_discover_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("exportd.yaml");
        std::fs::write(&path, "capacity: 8Gi\n").unwrap();

        let config = HostConfig::discover(Some(&path)).unwrap();
        assert_eq!(config.capacity, "8Gi");
    }

    #[test]
    fn test_discover_missing_explicit_path_fails() {
        let result = HostConfig::discover(Some(Path::new("/nonexistent/exportd.yaml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
