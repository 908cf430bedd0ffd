//! Persistence of the deployment status between invocations.

use anyhow::{Context, Result};
use staticdeploy_engine::{DeployConfig, DeploymentStatus};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Loads the recorded status. A missing file means nothing is deployed.
pub fn load_status(path: &Path) -> Result<DeploymentStatus> {
    if !path.exists() {
        return Ok(DeploymentStatus::Absent);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("state file {} is not valid JSON state", path.display()))
}

/// Writes the status atomically: a sibling temp file is renamed over `path`.
pub fn save_status(path: &Path, status: &DeploymentStatus) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, status)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path)
        .with_context(|| format!("failed to write state file {}", path.display()))?;
    Ok(())
}

/// Loads and validates the engine config, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<DeployConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("config {} is not valid JSON", path.display()))?
        }
        None => DeployConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
