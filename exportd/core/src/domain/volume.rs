// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Volume value objects.
//!
//! A volume has no stored record of its own: the on-disk directory and the
//! export table line ARE its state. The types here carry the validated name
//! and the fixed attributes every provisioned volume receives.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Validated volume name.
///
/// A name must be usable as a single path segment under the base volume
/// directory. Anything that could escape that directory (separators,
/// parent-dir components) is rejected before any side effect happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VolumeName(String);

impl VolumeName {
    /// Parse and validate a raw request name.
    pub fn parse(raw: &str) -> Result<Self, VolumeNameError> {
        if raw.is_empty() {
            return Err(VolumeNameError::Empty);
        }
        if raw.contains('/') || raw.contains('\\') {
            return Err(VolumeNameError::PathSeparator(raw.to_string()));
        }
        if raw.contains("..") {
            return Err(VolumeNameError::ParentDir(raw.to_string()));
        }
        if raw == "." {
            return Err(VolumeNameError::Reserved(raw.to_string()));
        }
        if raw.contains('\0') {
            return Err(VolumeNameError::NulByte(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VolumeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VolumeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Filesystem owner applied to volume directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeOwner {
    pub uid: u32,
    pub gid: u32,
}

impl VolumeOwner {
    /// The `nobody:nogroup` account NFS clients are squashed to.
    pub fn nobody() -> Self {
        Self {
            uid: 65534,
            gid: 65534,
        }
    }
}

/// Volume access mode. This system only hands out single-writer volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWriteOnce,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadWriteOnce => "ReadWriteOnce",
        }
    }
}

/// A provisioned volume: the validated name plus the fixed attributes the
/// host applies to every volume it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub name: VolumeName,
    /// Absolute directory path, `base_volume_path/name`.
    pub path: PathBuf,
    /// Directory owner; `None` skips chown (unprivileged development runs).
    pub owner: Option<VolumeOwner>,
    /// Directory permission bits.
    pub mode: u32,
    pub capacity: String,
    pub access_mode: AccessMode,
    pub reclaim_policy: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VolumeNameError {
    #[error("volume name is empty")]
    Empty,

    #[error("volume name {0:?} contains a path separator")]
    PathSeparator(String),

    #[error("volume name {0:?} contains a parent-directory component")]
    ParentDir(String),

    #[error("volume name {0:?} is a reserved path component")]
    Reserved(String),

    #[error("volume name {0:?} contains a NUL byte")]
    NulByte(String),
}
