//! AWS provider for flipdb
//!
//! - [`RdsDatabase`]: restores instances with `RestoreDBInstanceToPointInTime`
//!   from the latest restorable time of the source instance
//! - [`S3ObjectStore`]: descriptor blobs in an S3 bucket
//!
//! Credentials and region come from the standard AWS provider chain
//! (environment, profile, instance metadata).

pub mod error;
pub mod rds;
pub mod s3;

pub use rds::RdsDatabase;
pub use s3::S3ObjectStore;

pub use aws_config::SdkConfig;

use aws_config::{BehaviorVersion, Region};

/// Load shared SDK configuration, optionally overriding the region
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    let config = loader.load().await;
    tracing::debug!(
        "Loaded AWS config for region {}",
        config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| "(unset)".to_string())
    );
    config
}
