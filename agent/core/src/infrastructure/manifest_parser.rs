// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Manifest YAML Parser
//!
//! Parses the agent's capability/trust manifest into
//! [`crate::domain::manifest::AgentManifest`] and validates it.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external YAML → Domain objects

use crate::domain::manifest::AgentManifest;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

pub struct AgentManifestParser;

impl AgentManifestParser {
    /// Parse agent manifest from YAML string
    pub fn parse_yaml(yaml: &str) -> Result<AgentManifest> {
        let manifest: AgentManifest = serde_yaml::from_str(yaml).context("Failed to parse YAML manifest")?;

        manifest
            .validate()
            .map_err(|e| anyhow!("Manifest validation failed: {}", e))?;

        Ok(manifest)
    }

    /// Parse agent manifest from YAML file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<AgentManifest> {
        let yaml = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read manifest file: {:?}", path.as_ref()))?;

        Self::parse_yaml(&yaml)
    }

    /// Serialize agent manifest to YAML string
    pub fn to_yaml(manifest: &AgentManifest) -> Result<String> {
        serde_yaml::to_string(manifest).context("Failed to serialize manifest to YAML")
    }
}
