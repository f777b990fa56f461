// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod llm;
pub mod llm_oracle;
pub mod manifest_parser;
pub mod prompt_template_engine;
pub mod signing;

pub use llm_oracle::LlmOracle;
pub use manifest_parser::AgentManifestParser;
