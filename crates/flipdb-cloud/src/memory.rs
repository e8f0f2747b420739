//! In-process object store
//!
//! Keeps blobs in a map. Used by tests that need an [`ObjectStore`]
//! without network access.

use crate::error::{CloudError, Result};
use crate::provider::ObjectStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    reject_puts: AtomicBool,
    puts: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail with an API error
    pub fn reject_puts(&self, reject: bool) {
        self.reject_puts.store(reject, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Raw object contents, bypassing the trait
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(&(bucket.to_string(), key.to_string())).cloned())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let objects = self
            .objects
            .lock()
            .map_err(|e| CloudError::ApiError(e.to_string()))?;
        Ok(objects.get(&(bucket.to_string(), key.to_string())).cloned())
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        if self.reject_puts.load(Ordering::SeqCst) {
            return Err(CloudError::ApiError(format!(
                "write to {}/{} rejected",
                bucket, key
            )));
        }

        let mut objects = self
            .objects
            .lock()
            .map_err(|e| CloudError::ApiError(e.to_string()))?;
        objects.insert((bucket.to_string(), key.to_string()), body);
        self.puts.fetch_add(1, Ordering::SeqCst);

        tracing::debug!("Stored {}/{} in memory", bucket, key);
        Ok(())
    }
}
