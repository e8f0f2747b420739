//! DNSimple API client
//!
//! Direct DNSimple v2 API implementation for zone record management.
//! Uses Bearer token authentication.

use crate::error::{DnsimpleError, Result};
use async_trait::async_trait;
use flipdb_cloud::{DnsProvider, DnsRecord, DnsRecordRef};
use serde::{Deserialize, Serialize};

const DNSIMPLE_API_BASE: &str = "https://api.dnsimple.com/v2";

/// Base URL of the DNSimple sandbox environment
pub const SANDBOX_API_BASE: &str = "https://api.sandbox.dnsimple.com/v2";

/// DNSimple record client
pub struct DnsimpleClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for DnsimpleClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsimpleClient {
    pub fn new() -> Self {
        Self::with_base_url(DNSIMPLE_API_BASE)
    }

    /// Use a different API base, e.g. [`SANDBOX_API_BASE`]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn record_url(&self, record: &DnsRecordRef) -> String {
        format!(
            "{}/{}/zones/{}/records/{}",
            self.base_url, record.account_id, record.domain, record.record_id
        )
    }

    /// Fetch a zone record
    pub async fn fetch_record(&self, record: &DnsRecordRef) -> Result<DnsRecord> {
        let url = self.record_url(record);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&record.auth_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let body = read_body(response, record).await?;
        let api_response: ApiResponse<ApiZoneRecord> = serde_json::from_str(&body)?;
        Ok(api_response.data.into())
    }

    /// Change a zone record's content and TTL
    pub async fn patch_record(
        &self,
        record: &DnsRecordRef,
        content: &str,
        ttl: u32,
    ) -> Result<DnsRecord> {
        let url = self.record_url(record);
        tracing::debug!("PATCH {} -> {}", url, content);

        let request_body = UpdateZoneRecordRequest {
            content: content.to_string(),
            ttl,
        };

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&record.auth_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request_body)
            .send()
            .await?;

        let body = read_body(response, record).await?;
        let api_response: ApiResponse<ApiZoneRecord> = serde_json::from_str(&body)?;
        Ok(api_response.data.into())
    }
}

/// Turn a response into its body, mapping HTTP failures to typed errors
async fn read_body(response: reqwest::Response, record: &DnsRecordRef) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    Err(classify_failure(status.as_u16(), &body, record))
}

fn classify_failure(status: u16, body: &str, record: &DnsRecordRef) -> DnsimpleError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        401 | 403 => DnsimpleError::AuthenticationFailed(message),
        404 => DnsimpleError::RecordNotFound(format!(
            "{}/{} record {}",
            record.account_id, record.domain, record.record_id
        )),
        _ => DnsimpleError::ApiError { status, message },
    }
}

#[async_trait]
impl DnsProvider for DnsimpleClient {
    fn name(&self) -> &str {
        "dnsimple"
    }

    async fn get_record(&self, record: &DnsRecordRef) -> flipdb_cloud::Result<DnsRecord> {
        Ok(self.fetch_record(record).await?)
    }

    async fn update_record(
        &self,
        record: &DnsRecordRef,
        target: &str,
        ttl: u32,
    ) -> flipdb_cloud::Result<()> {
        let updated = self.patch_record(record, target, ttl).await?;
        tracing::info!(
            "DNSimple record {} ({}) now {}",
            updated.id,
            updated.name,
            updated.content
        );
        Ok(())
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiZoneRecord {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    r#type: String,
    content: String,
    ttl: u32,
}

impl From<ApiZoneRecord> for DnsRecord {
    fn from(r: ApiZoneRecord) -> Self {
        DnsRecord {
            id: r.id,
            name: r.name,
            record_type: r.r#type,
            content: r.content,
            ttl: r.ttl,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateZoneRecordRequest {
    content: String,
    ttl: u32,
}
