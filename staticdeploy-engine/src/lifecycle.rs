//! Deployment lifecycle: `absent` → `deployed` ⇄ `drifted` → `absent`.
//!
//! Transitions borrow the current status and return the next one, so a
//! failed transition leaves the caller holding the previous status.

use crate::error::DeployResult;
use crate::sync_engine::DeploymentEngine;
use crate::types::{DeploymentState, DriftReport, SourceLocator};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where a target bucket stands relative to its source archive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeploymentStatus {
    #[default]
    Absent,
    Deployed { state: DeploymentState },
    Drifted {
        state: DeploymentState,
        report: DriftReport,
    },
}

impl DeploymentStatus {
    pub fn state(&self) -> Option<&DeploymentState> {
        match self {
            DeploymentStatus::Absent => None,
            DeploymentStatus::Deployed { state } | DeploymentStatus::Drifted { state, .. } => {
                Some(state)
            }
        }
    }

    pub fn is_drifted(&self) -> bool {
        matches!(self, DeploymentStatus::Drifted { .. })
    }

    /// Deploys `locator` to `target_bucket` from any status.
    pub async fn deploy(
        &self,
        engine: &DeploymentEngine,
        locator: &SourceLocator,
        target_bucket: &str,
    ) -> DeployResult<DeploymentStatus> {
        let fingerprints = engine.deploy(locator, target_bucket).await?;
        Ok(DeploymentStatus::Deployed {
            state: DeploymentState {
                source: locator.clone(),
                target_bucket: target_bucket.to_string(),
                fingerprints,
                deployed_at: Utc::now(),
            },
        })
    }

    /// Re-reads the recorded deployment. `Absent` stays `Absent`.
    pub async fn refresh(&self, engine: &DeploymentEngine) -> DeployResult<DeploymentStatus> {
        let Some(state) = self.state() else {
            return Ok(DeploymentStatus::Absent);
        };

        let report = engine
            .check_drift(&state.source, &state.target_bucket, &state.fingerprints)
            .await?;

        let refreshed = DeploymentState {
            fingerprints: report.fingerprints.clone(),
            ..state.clone()
        };

        if report.has_drift() {
            Ok(DeploymentStatus::Drifted {
                state: refreshed,
                report,
            })
        } else {
            Ok(DeploymentStatus::Deployed { state: refreshed })
        }
    }

    /// Forgets the deployment. Objects in the target bucket are left in place.
    pub fn teardown(&self) -> DeploymentStatus {
        if let Some(state) = self.state() {
            info!(
                "forgetting deployment of {} to {} ({} objects left in place)",
                state.source,
                state.target_bucket,
                state.fingerprints.len()
            );
        }
        DeploymentStatus::Absent
    }
}
