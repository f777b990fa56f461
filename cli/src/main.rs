// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # ZTAP Agent CLI
//!
//! The `ztap` binary runs a Zero-Trust Agent Protocol agent and carries the
//! offline tooling around it.
//!
//! ## Commands
//!
//! - `ztap serve` - Bootstrap the agent (fail fast) and serve the HTTP API
//! - `ztap manifest show|validate` - Inspect an agent manifest
//! - `ztap verify` - Check a signed task against a manifest's trust key
//! - `ztap keygen` - Generate an Ed25519 signing key
//! - `ztap config show|validate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use ztap_agent::commands::{self, ConfigCommand, ManifestCommand};
use ztap_agent::logging::{init_logging, LogFormat};

/// ZTAP Agent - language understanding that never acts without a signed task
#[derive(Parser)]
#[command(name = "ztap")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ZTAP_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (overrides spec.server.port)
    #[arg(long, global = true, env = "ZTAP_PORT")]
    port: Option<u16>,

    /// HTTP API host (overrides spec.server.host)
    #[arg(long, global = true, env = "ZTAP_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ZTAP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, env = "ZTAP_LOG_FORMAT", value_enum, default_value = "compact")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent HTTP API
    #[command(name = "serve")]
    Serve,

    /// Inspect agent manifests
    #[command(name = "manifest")]
    Manifest {
        #[command(subcommand)]
        command: ManifestCommand,
    },

    /// Verify a signed task offline
    #[command(name = "verify")]
    Verify {
        #[command(flatten)]
        command: commands::verify::VerifyCommand,
    },

    /// Generate a new signing key
    #[command(name = "keygen")]
    Keygen {
        #[command(flatten)]
        command: commands::keygen::KeygenCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format).context("Failed to initialize logging")?;

    match cli.command {
        Some(Commands::Serve) => commands::serve::run(cli.config, cli.host, cli.port).await,
        Some(Commands::Manifest { command }) => commands::manifest::handle_command(command).await,
        Some(Commands::Verify { command }) => commands::verify::execute(command).await,
        Some(Commands::Keygen { command }) => commands::keygen::execute(command).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}
