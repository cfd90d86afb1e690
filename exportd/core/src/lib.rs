// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! exportd core: directory-backed NFS export volume provisioning.
//!
//! A request names a volume; the provisioner makes `base/{name}` exist in a
//! clean state, keeps the kernel export table in sync, asks the export
//! daemon to reload, and returns a PersistentVolume descriptor for the
//! cluster orchestrator.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
