//! Deployment error taxonomy

use std::time::Duration;
use thiserror::Error;

/// Descriptor persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No descriptor stored for deployment '{0}'")]
    NotFound(String),

    #[error("Failed to read descriptor '{key}': {message}")]
    Read { key: String, message: String },

    #[error("Descriptor '{key}' is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write descriptor '{key}': {message}")]
    Write { key: String, message: String },
}

/// Provisioning errors
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Instance '{identifier}' did not become available within {waited:?}")]
    Timeout { identifier: String, waited: Duration },

    #[error("Database provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Instance '{identifier}' entered terminal status '{status}'")]
    InstanceFailed { identifier: String, status: String },
}

/// DNS cutover errors
#[derive(Error, Debug)]
pub enum DnsError {
    #[error("DNS provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Record '{record}' reads '{observed}' after update, expected '{expected}'")]
    Unconfirmed {
        record: String,
        expected: String,
        observed: String,
    },
}

/// Terminal failure of a single invocation
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Deployment '{0}' not found")]
    NotFound(String),

    #[error("Provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error("DNS cutover failed: {0}")]
    Dns(#[from] DnsError),

    #[error("Descriptor store error: {0}")]
    Store(StoreError),

    #[error("Failed to persist descriptor: {0}")]
    Write(String),

    #[error(
        "DNS for deployment '{name}' was switched to {endpoint}, \
        but the descriptor could not be saved: {reason}\n\
        Live traffic and the stored descriptor disagree. Re-run the same command to reconcile."
    )]
    CommitAfterCutover {
        name: String,
        endpoint: String,
        /// Whether the record read back as `endpoint` before the save
        dns_confirmed: bool,
        reason: String,
    },
}

impl DeployError {
    /// Live DNS and the stored descriptor may have diverged
    pub fn is_critical(&self) -> bool {
        matches!(self, DeployError::CommitAfterCutover { .. })
    }
}

impl From<StoreError> for DeployError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(name) => DeployError::NotFound(name),
            StoreError::Write { .. } => DeployError::Write(err.to_string()),
            other => DeployError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
