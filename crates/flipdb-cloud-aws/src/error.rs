//! SDK error mapping

use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata};
use flipdb_cloud::CloudError;

const NOT_FOUND_CODES: &[&str] = &["DBInstanceNotFound", "NoSuchKey", "NotFound"];
const ALREADY_EXISTS_CODES: &[&str] = &["DBInstanceAlreadyExists"];
const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "ExpiredToken",
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "UnrecognizedClientException",
];

/// Map an SDK error onto the capability error type by its AWS error code
pub fn to_cloud_error<E>(err: E) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let code = err.code().map(str::to_string);
    let message = DisplayErrorContext(&err).to_string();

    match code.as_deref() {
        Some(c) if NOT_FOUND_CODES.contains(&c) => CloudError::ResourceNotFound(message),
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => CloudError::ResourceAlreadyExists(message),
        Some(c) if AUTH_CODES.contains(&c) => CloudError::AuthenticationFailed(message),
        _ => CloudError::ApiError(message),
    }
}
