// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `ztap verify`: offline check of a signed task against a manifest's trust key.
//!
//! Exits non-zero when the signature does not verify.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use ztap_core::domain::signature::SignatureError;
use ztap_core::domain::task::SignedTask;
use ztap_core::infrastructure::signing::verifier_for_trust;

use super::manifest::load_checked;

#[derive(Args)]
pub struct VerifyCommand {
    /// Signed task JSON file, or a full turn response containing `signed_task`
    #[arg(value_name = "SIGNED_TASK")]
    signed_task: PathBuf,

    /// Manifest holding the trusted public key
    #[arg(short, long, value_name = "MANIFEST")]
    manifest: PathBuf,
}

pub async fn execute(command: VerifyCommand) -> Result<()> {
    let signed = read_signed_task(&command.signed_task)?;

    match verify_file(&signed, &command.manifest)? {
        Ok(()) => {
            println!(
                "{}",
                format!("✓ Signature valid: {} ({})", signed.task.task_name(), signed.algorithm).green()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("✗ Signature rejected: {}", e).red());
            std::process::exit(2);
        }
    }
}

/// Outer error: the inputs could not be used. Inner error: the signature is bad.
pub fn verify_file(signed: &SignedTask, manifest_path: &Path) -> Result<Result<(), SignatureError>> {
    let manifest = load_checked(manifest_path)?;
    let verifier = verifier_for_trust(&manifest.spec.trust).context("Manifest trust key is unusable")?;
    Ok(verifier.verify(signed))
}

/// Accepts either a bare `SignedTask` or a turn response wrapping one.
pub fn read_signed_task(path: &Path) -> Result<SignedTask> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{:?} is not valid JSON", path))?;

    let inner = match value.get("signed_task") {
        Some(task) if !task.is_null() => task.clone(),
        Some(_) => anyhow::bail!("{:?} contains no signed task", path),
        None => value,
    };
    serde_json::from_value(inner).with_context(|| format!("{:?} is not a signed task", path))
}
