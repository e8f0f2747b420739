//! DNSimple provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DnsimpleError {
    #[error("DNSimple authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("DNS record not found: {0}")]
    RecordNotFound(String),

    #[error("DNSimple API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<DnsimpleError> for flipdb_cloud::CloudError {
    fn from(err: DnsimpleError) -> Self {
        use flipdb_cloud::CloudError;
        match err {
            DnsimpleError::AuthenticationFailed(msg) => CloudError::AuthenticationFailed(msg),
            DnsimpleError::RecordNotFound(record) => CloudError::ResourceNotFound(record),
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DnsimpleError>;
