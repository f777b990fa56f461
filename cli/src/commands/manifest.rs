// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent manifest commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use ztap_core::domain::manifest::AgentManifest;
use ztap_core::infrastructure::manifest_parser::AgentManifestParser;
use ztap_core::infrastructure::signing::verifier_for_trust;

#[derive(Subcommand)]
pub enum ManifestCommand {
    /// Print capabilities, slots and trust key of a manifest
    Show {
        /// Path to agent manifest YAML file
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Print the normalized YAML instead of a summary
        #[arg(long)]
        yaml: bool,
    },

    /// Validate a manifest, including its trust key
    Validate {
        /// Path to agent manifest YAML file
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },
}

pub async fn handle_command(command: ManifestCommand) -> Result<()> {
    match command {
        ManifestCommand::Show { manifest, yaml } => show(&manifest, yaml),
        ManifestCommand::Validate { manifest } => validate(&manifest),
    }
}

/// Parse and fully check a manifest, trust key included.
pub fn load_checked(path: &Path) -> Result<AgentManifest> {
    let manifest = AgentManifestParser::parse_file(path)?;
    verifier_for_trust(&manifest.spec.trust).context("Manifest trust key is unusable")?;
    Ok(manifest)
}

fn show(path: &Path, as_yaml: bool) -> Result<()> {
    let manifest = AgentManifestParser::parse_file(path)?;

    if as_yaml {
        println!("{}", AgentManifestParser::to_yaml(&manifest)?);
        return Ok(());
    }

    println!("{} {}", "Agent:".bold(), manifest.metadata.name);
    println!("  Version: {}", manifest.metadata.version);
    if let Some(greeting) = &manifest.spec.greeting {
        println!("  Greeting: {}", greeting);
    }
    println!();

    println!("{}", "Capabilities:".bold());
    for capability in &manifest.spec.capabilities {
        let mut flags = Vec::new();
        if capability.requires_confirmation {
            flags.push("confirm");
        }
        if capability.requires_user_auth {
            flags.push("user-auth");
        }
        if flags.is_empty() {
            println!("  {}", capability.name.bold());
        } else {
            println!("  {} [{}]", capability.name.bold(), flags.join(", ").cyan());
        }
        if let Some(description) = &capability.description {
            println!("    {}", description.dimmed());
        }
        for slot in &capability.slots {
            let marker = if slot.required { "required" } else { "optional" };
            println!("    - {} ({})", slot.name, marker);
        }
    }
    println!();

    println!("{}", "Trust:".bold());
    println!("  Algorithm: {}", manifest.spec.trust.algorithm);
    println!("  Public key: {}", manifest.spec.trust.public_key);

    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    println!("Validating manifest {}...", path.display());

    let manifest = load_checked(path)?;

    println!(
        "{}",
        format!(
            "✓ Manifest is valid: {} ({} capabilities)",
            manifest.metadata.name,
            manifest.spec.capabilities.len()
        )
        .green()
    );

    Ok(())
}
