//! Descriptor store
//!
//! Loads and saves descriptors through an [`ObjectStore`]. One object per
//! deployment name; a save is a single full overwrite, so a descriptor in the
//! bucket is always the last committed state.

use crate::descriptor::Descriptor;
use crate::error::StoreError;
use flipdb_cloud::ObjectStore;
use std::sync::Arc;

const DESCRIPTOR_EXTENSION: &str = "yml";

type Result<T> = std::result::Result<T, StoreError>;

pub struct DescriptorStore {
    objects: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
}

impl DescriptorStore {
    pub fn new(objects: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            objects,
            bucket: bucket.into(),
            prefix: String::new(),
        }
    }

    /// Store descriptors under `prefix` inside the bucket
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key for a deployment name
    pub fn key(&self, name: &str) -> String {
        format!("{}{}.{}", self.prefix, name, DESCRIPTOR_EXTENSION)
    }

    /// Load the descriptor for `name`
    pub async fn load(&self, name: &str) -> Result<Descriptor> {
        let key = self.key(name);
        let body = self
            .objects
            .get(&self.bucket, &key)
            .await
            .map_err(|e| StoreError::Read {
                key: key.clone(),
                message: e.to_string(),
            })?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        let content = String::from_utf8(body).map_err(|e| StoreError::Read {
            key: key.clone(),
            message: format!("not valid UTF-8: {}", e),
        })?;
        let descriptor =
            Descriptor::from_yaml(&content).map_err(|source| StoreError::Malformed {
                key: key.clone(),
                source,
            })?;

        tracing::debug!("Loaded descriptor s3://{}/{}", self.bucket, key);
        Ok(descriptor)
    }

    /// Whether a descriptor already exists for `name`
    pub async fn exists(&self, name: &str) -> Result<bool> {
        match self.load(name).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(StoreError::Malformed { .. }) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Overwrite the descriptor for `name`
    pub async fn save(&self, name: &str, descriptor: &Descriptor) -> Result<()> {
        let key = self.key(name);
        let content = descriptor.to_yaml().map_err(|e| StoreError::Write {
            key: key.clone(),
            message: e.to_string(),
        })?;

        self.objects
            .put(&self.bucket, &key, content.into_bytes())
            .await
            .map_err(|e| StoreError::Write {
                key: key.clone(),
                message: e.to_string(),
            })?;

        tracing::info!("Saved descriptor s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
