//! # LavaPro Console
//!
//! Command line front end for the laundry dashboard.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          lavapro <command>                              │
//! │                                                                         │
//! │  clap ──► ConsoleConfig ──► Baas (HTTP or demo) ──► Dashboard           │
//! │                                                        │                │
//! │                           session.toml ◄──────────────►│                │
//! │                                                        ▼                │
//! │                                              commands::run ──► stdout   │
//! │                                                                         │
//! │  Errors: anyhow chain ──► exit code (error.rs)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default: info for the console and session crates, warn elsewhere).

mod cli;
mod commands;
mod config;
mod error;
mod render;
mod session_file;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lavapro_baas::{Baas, BaasConfig};
use lavapro_session::{Dashboard, DashboardOptions};

use crate::cli::Cli;
use crate::commands::Context;
use crate::config::ConsoleConfig;
use crate::error::CliError;
use crate::session_file::SessionFile;

const DEFAULT_LOG_FILTER: &str = "warn,lavapro_console=info,lavapro_session=info";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the command context from flags and configuration.
fn build_context(cli: &Cli) -> Result<Context, CliError> {
    let config = ConsoleConfig::load(cli.config.as_deref())?;
    let demo = cli.demo || config.demo;

    let baas = if demo {
        info!("Using the demo dataset");
        Baas::demo()
    } else {
        let baas_config = BaasConfig::from_env()?.with_timeout(config.timeout());
        info!(url = %baas_config.url, "Using hosted backend");
        Baas::http(baas_config)?
    };

    let credentials = match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => Some((email.clone(), password.clone())),
        _ => None,
    };
    // Demo tokens mean nothing to the next process, and one-shot
    // credentials must not overwrite the stored session.
    let session_file = if demo || credentials.is_some() {
        None
    } else {
        Some(SessionFile::new(config.session_path()?))
    };

    let dashboard = Dashboard::new(
        baas,
        DashboardOptions {
            revenue_months: config.revenue_months,
        },
    );

    Ok(Context {
        dashboard,
        session_file,
        credentials,
        json: cli.json,
        demo,
    })
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = build_context(&cli)?;
    commands::run(&ctx, cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = crate::error::exit_code(&e);
            error!(exit_code = code, "Command failed");
            eprintln!("error: {:#}", e);
            ExitCode::from(code)
        }
    }
}
