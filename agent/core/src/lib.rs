// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Zero-Trust Agent Protocol core.
//!
//! # Architecture
//!
//! - **domain:** protocol values, invariants and collaborator seams
//! - **application:** dialogue policy, protocol facade, startup wiring
//! - **infrastructure:** Ed25519 signing, manifest parsing, LLM oracle
//! - **presentation:** axum HTTP binding

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::*;
