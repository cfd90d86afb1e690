// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod fs_store;
pub mod exports_file;
pub mod exportfs;

pub use exportfs::ExportfsReloader;
pub use exports_file::ExportsFile;
pub use fs_store::FsDirectoryStore;
