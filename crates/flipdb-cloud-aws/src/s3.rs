//! S3 object store

use crate::error::to_cloud_error;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use flipdb_cloud::{CloudError, ObjectStore, Result};

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) => {
                let err = to_cloud_error(e);
                if err.is_not_found() {
                    tracing::debug!("s3://{}/{} does not exist", bucket, key);
                    return Ok(None);
                }
                return Err(err);
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| CloudError::ApiError(format!("reading s3://{}/{}: {}", bucket, key, e)))?;
        Ok(Some(data.into_bytes().to_vec()))
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("application/x-yaml")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(to_cloud_error)?;

        tracing::debug!("Wrote s3://{}/{}", bucket, key);
        Ok(())
    }
}
