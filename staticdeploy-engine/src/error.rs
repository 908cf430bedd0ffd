//! Deployment error types.

use thiserror::Error;

/// Result type for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors that can occur while fetching, digesting, or deploying an archive.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid format: {0}")]
    Format(String),

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("listing bucket {bucket} failed: {reason}")]
    Listing { bucket: String, reason: String },

    #[error("failed to read archive entry {entry}: {reason}")]
    EntryRead { entry: String, reason: String },

    #[error("failed to upload {entry}: {reason}")]
    Upload { entry: String, reason: String },

    #[error("{what} is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge { what: String, size: u64, limit: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DeployError {
    /// Name of the archive entry this error concerns, if any.
    pub fn entry(&self) -> Option<&str> {
        match self {
            DeployError::EntryRead { entry, .. } | DeployError::Upload { entry, .. } => {
                Some(entry)
            }
            _ => None,
        }
    }
}
