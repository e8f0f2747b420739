//! DNS cutover

use crate::descriptor::DnsConfig;
use crate::error::DnsError;
use flipdb_cloud::DnsProvider;
use std::sync::Arc;

type Result<T> = std::result::Result<T, DnsError>;

pub struct DnsCutover {
    dns: Arc<dyn DnsProvider>,
}

impl DnsCutover {
    pub fn new(dns: Arc<dyn DnsProvider>) -> Self {
        Self { dns }
    }

    /// Point the configured record at `endpoint` and read it back.
    ///
    /// Returns [`DnsError::Unconfirmed`] when the provider acknowledged the
    /// write but the record still reads differently.
    pub async fn point_to(&self, config: &DnsConfig, endpoint: &str) -> Result<()> {
        let record = config.record_ref();
        let fqdn = config.fqdn();

        let existing = self
            .dns
            .get_record(&record)
            .await
            .map_err(|e| DnsError::ProviderRejected(e.to_string()))?;

        if existing.points_to(endpoint) {
            tracing::info!("DNS record {} already points to {}", fqdn, endpoint);
            return Ok(());
        }

        tracing::info!(
            "Updating DNS record {} from {} to {} (ttl {})",
            fqdn,
            existing.content,
            endpoint,
            config.ttl
        );
        self.dns
            .update_record(&record, endpoint, config.ttl)
            .await
            .map_err(|e| DnsError::ProviderRejected(e.to_string()))?;

        let observed = self
            .dns
            .get_record(&record)
            .await
            .map_err(|e| DnsError::ProviderRejected(e.to_string()))?;

        if !observed.points_to(endpoint) {
            return Err(DnsError::Unconfirmed {
                record: fqdn,
                expected: endpoint.to_string(),
                observed: observed.content,
            });
        }
        Ok(())
    }

    /// Current target of the configured record
    pub async fn current_target(&self, config: &DnsConfig) -> Result<String> {
        self.dns
            .get_record(&config.record_ref())
            .await
            .map(|record| record.content)
            .map_err(|e| DnsError::ProviderRejected(e.to_string()))
    }
}
