//! staticdeploy CLI
//!
//! Runs one engine operation per invocation and keeps the deployment status
//! in a JSON state file between runs.

mod cli;
mod state_file;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use staticdeploy_engine::s3_transport::S3Transport;
use staticdeploy_engine::{DeploymentEngine, DeploymentStatus, SourceLocator};
use std::sync::Arc;
use tracing::{info, warn};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = state_file::load_config(cli.config.as_deref())?;
    if let Some(policy) = cli.command.upload_policy() {
        config.upload_policy = policy;
    }

    let transport = S3Transport::from_config(&config)
        .await
        .context("failed to build S3 client")?;
    let engine = DeploymentEngine::new(Arc::new(transport), &config);
    let current = state_file::load_status(&cli.state)?;

    match cli.command {
        Commands::Deploy {
            source,
            version,
            target,
            ..
        } => {
            let locator = SourceLocator::parse(&source, version)?;
            let next = current
                .deploy(&engine, &locator, &target)
                .await
                .with_context(|| format!("deploy of {locator} to {target} failed"))?;
            state_file::save_status(&cli.state, &next)?;
            print_json(&next)
        }
        Commands::Refresh => {
            if current == DeploymentStatus::Absent {
                warn!("nothing deployed according to {}", cli.state.display());
            }
            let next = current.refresh(&engine).await.context("refresh failed")?;
            state_file::save_status(&cli.state, &next)?;
            print_json(&next)
        }
        Commands::Teardown => {
            let next = current.teardown();
            state_file::save_status(&cli.state, &next)?;
            info!("state cleared in {}", cli.state.display());
            print_json(&next)
        }
        Commands::ShowTarget { bucket } => {
            let fingerprints = engine.target_fingerprints(&bucket).await?;
            print_json(&fingerprints)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
