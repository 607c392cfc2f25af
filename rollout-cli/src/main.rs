//! rollout: ArgoCD and blue/green operator commands.
//!
//! # Usage
//!
//! ```text
//! rollout values <app> <dev|staging|production> <key> <value>
//! rollout promote <app> <namespace> [--replicas N] [--skip-confirmation]
//! rollout smoke [--app <name>]...
//! ```
//!
//! Every command accepts `--config <path>`; otherwise `./rollout.yaml` is used
//! when present.

mod commands;
mod console;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{promote::PromoteArgs, smoke::SmokeArgs, values::ValuesArgs};
use rollout_core::config;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "rollout",
    version,
    about = "Edit Helm values, promote blue/green deployments and smoke-test ArgoCD applications",
    long_about = None,
)]
struct Cli {
    /// Configuration file (defaults to ./rollout.yaml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Change one Helm value, push it to ArgoCD and wait for the sync.
    Values(ValuesArgs),

    /// Promote the green deployment and scale blue down.
    Promote(PromoteArgs),

    /// Check sync and health status of ArgoCD applications.
    Smoke(SmokeArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "configuration resolved");

    match cli.command {
        Commands::Values(args) => args.run(&config),
        Commands::Promote(args) => args.run(&config),
        Commands::Smoke(args) => args.run(&config),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
