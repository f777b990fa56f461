// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `ztap keygen`: create an Ed25519 signing seed and print the manifest trust key.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use ztap_core::infrastructure::signing::Ed25519TaskSigner;

#[derive(Args)]
pub struct KeygenCommand {
    /// Write the hex seed to a new file (mode 0600 on Unix) instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

pub async fn execute(command: KeygenCommand) -> Result<()> {
    let (seed_hex, public_key) = generate();

    match &command.output {
        Some(path) => {
            write_secret(path, &seed_hex)?;
            println!(
                "{}",
                format!("✓ Signing key written: {}", path.display()).green()
            );
            println!("  Reference it as spec.signing_key: \"file:{}\"", path.display());
        }
        None => {
            println!("{}", "Signing key (hex seed, keep secret):".bold());
            println!("  {}", seed_hex);
        }
    }

    println!();
    println!("{}", "Manifest trust section:".bold());
    println!("  trust:");
    println!("    algorithm: Ed25519");
    println!("    public_key: \"{}\"", public_key);

    Ok(())
}

/// Fresh seed as hex, and the matching public key as base64.
pub fn generate() -> (String, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let seed = signing_key.to_bytes();
    let public_key = Ed25519TaskSigner::from_seed(seed).public_key_base64();
    (hex::encode(seed), public_key)
}

fn write_secret(path: &Path, contents: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to create key file {:?}", path))?;
    writeln!(file, "{}", contents).with_context(|| format!("Failed to write key to {:?}", path))?;

    Ok(())
}
