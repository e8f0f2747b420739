//! Wiring of settings to the AWS and DNSimple backends

use flipdb_cloud::{DatabaseProvider, DnsProvider, ObjectStore};
use flipdb_cloud_aws::{RdsDatabase, S3ObjectStore, SdkConfig};
use flipdb_cloud_dnsimple::DnsimpleClient;
use flipdb_config::Settings;
use flipdb_core::{DescriptorStore, Orchestrator};
use std::sync::Arc;

pub struct Context {
    pub settings: Settings,
    sdk: SdkConfig,
}

impl Context {
    /// Resolve settings and AWS configuration.
    ///
    /// Fails on a missing bucket before any request is sent.
    pub async fn load() -> anyhow::Result<Self> {
        let settings = Settings::load()?;
        let sdk = flipdb_cloud_aws::load_sdk_config(settings.region.as_deref()).await;
        Ok(Self { settings, sdk })
    }

    pub fn store(&self) -> DescriptorStore {
        let objects: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&self.sdk));
        DescriptorStore::new(objects, &self.settings.bucket)
            .with_prefix(&self.settings.key_prefix)
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let database: Arc<dyn DatabaseProvider> = Arc::new(RdsDatabase::new(&self.sdk));
        let dns: Arc<dyn DnsProvider> = Arc::new(DnsimpleClient::new());
        Orchestrator::new(
            self.store(),
            database,
            dns,
            self.settings.to_deploy_settings(),
        )
    }
}
