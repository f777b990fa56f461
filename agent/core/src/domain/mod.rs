// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: protocol values, invariants and the seams to external
//! collaborators (signing, language oracle, LLM vendors). Configuration
//! discovery is the only I/O here.

pub mod agent_config;
pub mod conversation;
pub mod credential;
pub mod errors;
pub mod llm;
pub mod manifest;
pub mod oracle;
pub mod signature;
pub mod task;
