// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod volume;
pub mod descriptor;
pub mod export;
pub mod config;
