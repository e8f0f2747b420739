//! Capability trait definitions

use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// Managed relational database capability
///
/// Implemented by the RDS backend and by test fakes. Every call is expected
/// to be bounded by the implementation's own timeout/retry policy.
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    /// Returns the provider name (e.g., "rds")
    fn name(&self) -> &str;

    /// Request creation of a new instance restored from `request.source_identifier`.
    ///
    /// Returns once the provider has accepted the request; the instance is
    /// usually still pending at that point.
    async fn create_from_source(&self, request: &CreateInstanceRequest) -> Result<()>;

    /// Describe an instance, `None` if the provider does not know it
    async fn describe(&self, identifier: &str) -> Result<Option<InstanceDescription>>;

    /// Replace the master user password of an existing instance
    async fn set_master_password(&self, identifier: &str, password: &str) -> Result<()>;

    /// Delete an instance without a final snapshot
    async fn delete(&self, identifier: &str) -> Result<()>;
}

/// DNS record capability
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Returns the provider name (e.g., "dnsimple")
    fn name(&self) -> &str;

    /// Read the record's current target
    async fn get_record(&self, record: &DnsRecordRef) -> Result<DnsRecord>;

    /// Point the record at `target` with the given TTL
    async fn update_record(&self, record: &DnsRecordRef, target: &str, ttl: u32) -> Result<()>;
}

/// Blob storage capability
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object, `None` if the key does not exist
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write an object, fully replacing any previous value
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}

/// Parameters for restoring a new instance from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInstanceRequest {
    /// Identifier of the instance to create
    pub identifier: String,

    /// Instance (or snapshot) the new instance is restored from
    pub source_identifier: String,

    pub instance_class: String,
    pub availability_zone: String,
    pub subnet_group_name: String,
    pub publicly_accessible: bool,
    pub security_group_ids: BTreeSet<String>,
    pub tags: BTreeMap<String, String>,
}

/// Snapshot of an instance as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDescription {
    pub identifier: String,
    pub status: InstanceStatus,

    /// Connection hostname, only present once the provider has assigned one
    pub endpoint: Option<String>,
}

/// Lifecycle status of a database instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceStatus {
    Available,
    Creating,
    Modifying,
    Failed,
    Deleting,
    Deleted,
    /// Any other provider-specific status (backing-up, resetting-master-credentials, ...)
    Other(String),
}

impl InstanceStatus {
    /// Map a raw provider status string
    pub fn from_provider(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "available" => InstanceStatus::Available,
            "creating" => InstanceStatus::Creating,
            "modifying" => InstanceStatus::Modifying,
            "failed" | "incompatible-restore" => InstanceStatus::Failed,
            "deleting" => InstanceStatus::Deleting,
            "deleted" => InstanceStatus::Deleted,
            other => InstanceStatus::Other(other.to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, InstanceStatus::Available)
    }

    /// The instance will never become available from this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstanceStatus::Failed | InstanceStatus::Deleting | InstanceStatus::Deleted
        )
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceStatus::Available => write!(f, "available"),
            InstanceStatus::Creating => write!(f, "creating"),
            InstanceStatus::Modifying => write!(f, "modifying"),
            InstanceStatus::Failed => write!(f, "failed"),
            InstanceStatus::Deleting => write!(f, "deleting"),
            InstanceStatus::Deleted => write!(f, "deleted"),
            InstanceStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Identifies one DNS record at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecordRef {
    pub auth_token: String,
    pub account_id: String,
    pub domain: String,
    pub record_id: u64,
}

/// A DNS record as read back from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub id: u64,
    pub name: String,
    pub record_type: String,
    pub content: String,
    pub ttl: u32,
}

impl DnsRecord {
    /// Whether the record resolves to `target`, ignoring a trailing root dot
    pub fn points_to(&self, target: &str) -> bool {
        self.content.trim_end_matches('.') == target.trim_end_matches('.')
    }
}
