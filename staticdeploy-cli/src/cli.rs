//! Argument parsing.

use clap::{Parser, Subcommand};
use staticdeploy_engine::UploadPolicy;
use std::path::PathBuf;

/// Deploys versioned ZIP archives into S3 buckets and checks them for drift.
#[derive(Parser, Debug)]
#[command(name = "staticdeploy", version, about, long_about = None)]
pub struct Cli {
    /// Engine configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true, env = "STATICDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Deployment state file (JSON). Created on first deploy.
    #[arg(long, global = true, default_value = "staticdeploy.state.json")]
    pub state: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Upload every entry of an archive to the target bucket
    Deploy {
        /// Source archive as "<bucket>/<key>"
        #[arg(long)]
        source: String,

        /// Pin a specific object version of the archive
        #[arg(long)]
        version: Option<String>,

        /// Target bucket
        #[arg(long)]
        target: String,

        /// Only upload entries whose fingerprint differs from the target
        #[arg(long)]
        skip_unchanged: bool,
    },

    /// Re-read the recorded deployment and report drift
    Refresh,

    /// Forget the recorded deployment. Target objects are left in place.
    Teardown,

    /// Print the fingerprints of the objects in a bucket
    ShowTarget {
        /// Bucket to list
        bucket: String,
    },
}

impl Commands {
    /// Upload policy requested on the command line, if any.
    pub fn upload_policy(&self) -> Option<UploadPolicy> {
        match self {
            Commands::Deploy {
                skip_unchanged: true,
                ..
            } => Some(UploadPolicy::SkipUnchanged),
            _ => None,
        }
    }
}
