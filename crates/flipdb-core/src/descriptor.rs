//! Deployment descriptor
//!
//! The descriptor is the only durable record of a deployment: which
//! instance currently takes traffic, which one is standing by, and the
//! parameters every new instance is created with. It is stored as YAML so
//! operators can inspect it directly in the bucket.

use crate::error::{DeployError, Result};
use crate::role::Role;
use flipdb_cloud::DnsRecordRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const MASK: &str = "********";

/// Persisted state of one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Descriptor {
    #[serde(rename = "SourceDBInstanceIdentifier")]
    pub source_instance_identifier: String,

    #[serde(rename = "DBMasterUserPassword", default)]
    pub master_password: String,

    #[serde(rename = "DBInstanceClass")]
    pub instance_class: String,

    pub availability_zone: String,

    #[serde(rename = "DBSubnetGroupName")]
    pub subnet_group_name: String,

    #[serde(default)]
    pub publicly_accessible: bool,

    #[serde(rename = "VPCSecurityGroupIds", default)]
    pub security_group_ids: BTreeSet<String>,

    #[serde(rename = "DBInstanceTags", default)]
    pub instance_tags: BTreeMap<String, String>,

    #[serde(rename = "DNSimple")]
    pub dns: DnsConfig,

    /// Role receiving traffic
    pub current: InstanceRef,

    /// Role standing by for rollback
    pub previous: InstanceRef,

    #[serde(rename = "Rollback", default)]
    pub rollback_requested: bool,
}

/// The single DNS record that must resolve to the active instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnsConfig {
    #[serde(default)]
    pub auth_token: String,

    #[serde(rename = "AccountID")]
    pub account_id: String,

    pub domain: String,

    #[serde(rename = "RecordID")]
    pub record_id: u64,

    #[serde(default)]
    pub record_name: String,

    #[serde(rename = "TTL", default = "default_ttl")]
    pub ttl: u32,
}

fn default_ttl() -> u32 {
    60
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            auth_token: String::new(),
            account_id: String::new(),
            domain: String::new(),
            record_id: 0,
            record_name: String::new(),
            ttl: default_ttl(),
        }
    }
}

impl DnsConfig {
    pub fn record_ref(&self) -> DnsRecordRef {
        DnsRecordRef {
            auth_token: self.auth_token.clone(),
            account_id: self.account_id.clone(),
            domain: self.domain.clone(),
            record_id: self.record_id,
        }
    }

    /// Check that the record can be addressed at the provider
    pub fn validate(&self) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(DeployError::Validation(
                "Please specify DNSimple account ID".to_string(),
            ));
        }
        if self.domain.trim().is_empty() {
            return Err(DeployError::Validation(
                "Please specify DNSimple domain".to_string(),
            ));
        }
        if self.record_id == 0 {
            return Err(DeployError::Validation(
                "Please specify DNSimple record ID".to_string(),
            ));
        }
        Ok(())
    }

    /// Human readable record name, e.g. `db.example.com`
    pub fn fqdn(&self) -> String {
        if self.record_name.is_empty() {
            self.domain.clone()
        } else {
            format!("{}.{}", self.record_name, self.domain)
        }
    }
}

/// An instance slot: identifier plus endpoint once provisioned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceRef {
    pub instance_identifier: String,

    #[serde(default)]
    pub endpoint: String,
}

impl InstanceRef {
    pub fn new(instance_identifier: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            instance_identifier: instance_identifier.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn is_provisioned(&self) -> bool {
        !self.endpoint.is_empty()
    }
}

/// Operator-supplied parameters for a brand new deployment
#[derive(Debug, Clone, Default)]
pub struct NewDeployment {
    pub name: String,
    pub source_instance_identifier: String,
    pub instance_identifier_base: String,
    pub availability_zone: String,
    pub subnet_group_name: String,
    pub master_password: String,
    pub instance_class: String,
    pub publicly_accessible: bool,
    pub security_group_ids: BTreeSet<String>,
    pub instance_tags: BTreeMap<String, String>,
    pub dns: DnsConfig,
    pub rollback: bool,
}

impl NewDeployment {
    /// Check required identifiers before anything touches the network
    pub fn validate(&self) -> Result<()> {
        let required = [
            (
                &self.source_instance_identifier,
                "Please specify original DB instance identifier",
            ),
            (
                &self.instance_identifier_base,
                "Please specify DB instance identifier base",
            ),
            (
                &self.availability_zone,
                "Please specify DB instance AvailabilityZone",
            ),
            (
                &self.subnet_group_name,
                "Please specify DB instance SubnetGroupName",
            ),
            (&self.name, "Please specify deployment name"),
        ];

        for (value, message) in required {
            if value.trim().is_empty() {
                return Err(DeployError::Validation(message.to_string()));
            }
        }
        self.dns.validate()
    }
}

impl Descriptor {
    /// Build the first descriptor of a deployment: blue active, green idle,
    /// neither provisioned yet.
    pub fn initial(params: &NewDeployment) -> Result<Self> {
        params.validate()?;

        let base = params.instance_identifier_base.trim();
        Ok(Self {
            source_instance_identifier: params.source_instance_identifier.clone(),
            master_password: params.master_password.clone(),
            instance_class: params.instance_class.clone(),
            availability_zone: params.availability_zone.clone(),
            subnet_group_name: params.subnet_group_name.clone(),
            publicly_accessible: params.publicly_accessible,
            security_group_ids: params.security_group_ids.clone(),
            instance_tags: params.instance_tags.clone(),
            dns: params.dns.clone(),
            current: InstanceRef::new(Role::Blue.identifier(base), ""),
            previous: InstanceRef::new(Role::Green.identifier(base), ""),
            rollback_requested: params.rollback,
        })
    }

    /// Base name and role of the instance currently taking traffic
    pub fn active_role(&self) -> Result<(&str, Role)> {
        Role::parse_identifier(&self.current.instance_identifier)
    }

    /// Check the role invariants of a loaded descriptor
    pub fn validate(&self) -> Result<()> {
        let (current_base, current_role) = self.active_role()?;
        let (previous_base, previous_role) =
            Role::parse_identifier(&self.previous.instance_identifier)?;

        if current_base != previous_base || current_role == previous_role {
            return Err(DeployError::Validation(format!(
                "current '{}' and previous '{}' are not a blue/green pair",
                self.current.instance_identifier, self.previous.instance_identifier
            )));
        }
        self.dns.validate()
    }

    /// Copy with secrets replaced, for display
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if !masked.master_password.is_empty() {
            masked.master_password = MASK.to_string();
        }
        if !masked.dns.auth_token.is_empty() {
            masked.dns.auth_token = MASK.to_string();
        }
        masked
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

/// Parse `key1=value1,key2=value2` into instance tags
pub fn parse_tags(input: &str) -> Result<BTreeMap<String, String>> {
    let mut tags = BTreeMap::new();
    if input.trim().is_empty() {
        return Ok(tags);
    }

    for pair in input.split(',') {
        match pair.split('=').collect::<Vec<_>>().as_slice() {
            [key, value] if !key.trim().is_empty() => {
                tags.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => {
                return Err(DeployError::Validation(
                    "-db-instance-tags is illegal format, please set like 'key1=value1,key2=value2'"
                        .to_string(),
                ));
            }
        }
    }
    Ok(tags)
}

/// Parse a comma separated list of security group ids
pub fn parse_security_groups(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
