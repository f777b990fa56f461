// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for ZTAP CLI

pub mod config;
pub mod keygen;
pub mod manifest;
pub mod serve;
pub mod verify;

pub use self::config::ConfigCommand;
pub use self::manifest::ManifestCommand;
