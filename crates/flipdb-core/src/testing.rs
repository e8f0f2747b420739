//! Fakes for the capability traits, shared by the unit tests

use crate::descriptor::{
    Descriptor, DnsConfig, NewDeployment, parse_security_groups, parse_tags,
};
use async_trait::async_trait;
use flipdb_cloud::{
    CloudError, CreateInstanceRequest, DatabaseProvider, DnsProvider, DnsRecord, DnsRecordRef,
    InstanceDescription, InstanceStatus,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub(crate) fn sample_params() -> NewDeployment {
    NewDeployment {
        name: "orders-db".to_string(),
        source_instance_identifier: "orders-db-src".to_string(),
        instance_identifier_base: "orders".to_string(),
        availability_zone: "ap-northeast-1a".to_string(),
        subnet_group_name: "private".to_string(),
        master_password: "hunter2".to_string(),
        instance_class: "db.m3.medium".to_string(),
        publicly_accessible: true,
        security_group_ids: parse_security_groups("sg-1,sg-2"),
        instance_tags: parse_tags("team=orders,env=prod").unwrap(),
        dns: DnsConfig {
            auth_token: "token".to_string(),
            account_id: "1010".to_string(),
            domain: "example.com".to_string(),
            record_id: 42,
            record_name: "db".to_string(),
            ttl: 60,
        },
        rollback: false,
    }
}

/// Blue active at `blue.rds.example`, green never provisioned
pub(crate) fn sample_descriptor() -> Descriptor {
    let mut descriptor = Descriptor::initial(&sample_params()).unwrap();
    descriptor.current.endpoint = "blue.rds.example".to_string();
    descriptor
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create(String),
    Describe {
        identifier: String,
        status: Option<String>,
    },
    SetPassword(String),
    Delete(String),
    GetRecord,
    UpdateRecord(String),
}

/// Ordered record of calls across fakes
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug)]
struct FakeInstance {
    pending_polls: u32,
    /// Polls that still report `available` after a modification was accepted
    stale_polls: u32,
    modifying_polls: u32,
}

impl FakeInstance {
    fn pending(polls: u32) -> Self {
        Self {
            pending_polls: polls,
            stale_polls: 0,
            modifying_polls: 0,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDatabase {
    instances: Mutex<HashMap<String, FakeInstance>>,
    endpoints: HashMap<String, String>,
    available_after: u32,
    never_available: bool,
    password_stale_polls: u32,
    password_modifying_polls: u32,
    fail_status: Option<String>,
    reject_create: bool,
    requests: Mutex<Vec<CreateInstanceRequest>>,
    log: CallLog,
}

impl FakeDatabase {
    pub(crate) fn new() -> Self {
        Self {
            password_modifying_polls: 1,
            ..Default::default()
        }
    }

    pub(crate) fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Report `creating` for the first `polls` describes of a new instance
    pub(crate) fn becomes_available_after(mut self, polls: u32) -> Self {
        self.available_after = polls;
        self
    }

    /// After a password change, keep reporting `available` for `stale_polls`
    /// describes before the instance shows `modifying`
    pub(crate) fn password_reset_after(mut self, stale_polls: u32) -> Self {
        self.password_stale_polls = stale_polls;
        self
    }

    pub(crate) fn never_available(mut self) -> Self {
        self.never_available = true;
        self
    }

    pub(crate) fn fails_with(mut self, status: &str) -> Self {
        self.fail_status = Some(status.to_string());
        self
    }

    pub(crate) fn rejects_create(mut self) -> Self {
        self.reject_create = true;
        self
    }

    pub(crate) fn with_endpoint(mut self, identifier: &str, endpoint: &str) -> Self {
        self.endpoints
            .insert(identifier.to_string(), endpoint.to_string());
        self
    }

    pub(crate) fn insert_available(&self, identifier: &str) {
        self.instances
            .lock()
            .unwrap()
            .insert(identifier.to_string(), FakeInstance::pending(0));
    }

    pub(crate) fn insert_pending(&self, identifier: &str) {
        self.instances.lock().unwrap().insert(
            identifier.to_string(),
            FakeInstance::pending(self.available_after),
        );
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.log.calls()
    }

    pub(crate) fn creates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_request(&self) -> Option<CreateInstanceRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn endpoint_of(&self, identifier: &str) -> String {
        self.endpoints
            .get(identifier)
            .cloned()
            .unwrap_or_else(|| format!("{}.rds.example", identifier))
    }
}

#[async_trait]
impl DatabaseProvider for FakeDatabase {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create_from_source(
        &self,
        request: &CreateInstanceRequest,
    ) -> flipdb_cloud::Result<()> {
        self.log.push(Call::Create(request.identifier.clone()));
        if self.reject_create {
            return Err(CloudError::ApiError("InsufficientDBInstanceCapacity".into()));
        }
        self.requests.lock().unwrap().push(request.clone());
        self.insert_pending(&request.identifier);
        Ok(())
    }

    async fn describe(
        &self,
        identifier: &str,
    ) -> flipdb_cloud::Result<Option<InstanceDescription>> {
        let mut instances = self.instances.lock().unwrap();
        let description = instances.get_mut(identifier).map(|instance| {
            let status = if let Some(status) = &self.fail_status {
                InstanceStatus::from_provider(status)
            } else if self.never_available {
                InstanceStatus::Creating
            } else if instance.pending_polls > 0 {
                instance.pending_polls -= 1;
                InstanceStatus::Creating
            } else if instance.stale_polls > 0 {
                instance.stale_polls -= 1;
                InstanceStatus::Available
            } else if instance.modifying_polls > 0 {
                instance.modifying_polls -= 1;
                InstanceStatus::Modifying
            } else {
                InstanceStatus::Available
            };
            let endpoint = status.is_available().then(|| self.endpoint_of(identifier));
            InstanceDescription {
                identifier: identifier.to_string(),
                status,
                endpoint,
            }
        });

        self.log.push(Call::Describe {
            identifier: identifier.to_string(),
            status: description.as_ref().map(|d| d.status.to_string()),
        });
        Ok(description)
    }

    async fn set_master_password(
        &self,
        identifier: &str,
        _password: &str,
    ) -> flipdb_cloud::Result<()> {
        self.log.push(Call::SetPassword(identifier.to_string()));
        match self.instances.lock().unwrap().get_mut(identifier) {
            Some(instance) => {
                instance.stale_polls = self.password_stale_polls;
                instance.modifying_polls = self.password_modifying_polls;
                Ok(())
            }
            None => Err(CloudError::ResourceNotFound(identifier.to_string())),
        }
    }

    async fn delete(&self, identifier: &str) -> flipdb_cloud::Result<()> {
        self.log.push(Call::Delete(identifier.to_string()));
        match self.instances.lock().unwrap().remove(identifier) {
            Some(_) => Ok(()),
            None => Err(CloudError::ResourceNotFound(identifier.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDns {
    target: Mutex<String>,
    ignore_updates: bool,
    reject_updates: bool,
    ttls: Mutex<Vec<u32>>,
    log: CallLog,
}

impl FakeDns {
    pub(crate) fn new(target: &str) -> Self {
        Self {
            target: Mutex::new(target.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Acknowledge updates without applying them
    pub(crate) fn ignores_updates(mut self) -> Self {
        self.ignore_updates = true;
        self
    }

    pub(crate) fn rejects_updates(mut self) -> Self {
        self.reject_updates = true;
        self
    }

    pub(crate) fn target(&self) -> String {
        self.target.lock().unwrap().clone()
    }

    pub(crate) fn update_count(&self) -> usize {
        self.ttls.lock().unwrap().len()
    }

    pub(crate) fn last_ttl(&self) -> Option<u32> {
        self.ttls.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl DnsProvider for FakeDns {
    fn name(&self) -> &str {
        "fake"
    }

    async fn get_record(&self, record: &DnsRecordRef) -> flipdb_cloud::Result<DnsRecord> {
        self.log.push(Call::GetRecord);
        Ok(DnsRecord {
            id: record.record_id,
            name: "db".to_string(),
            record_type: "CNAME".to_string(),
            content: self.target(),
            ttl: 60,
        })
    }

    async fn update_record(
        &self,
        _record: &DnsRecordRef,
        target: &str,
        ttl: u32,
    ) -> flipdb_cloud::Result<()> {
        self.log.push(Call::UpdateRecord(target.to_string()));
        if self.reject_updates {
            return Err(CloudError::AuthenticationFailed("token expired".into()));
        }
        self.ttls.lock().unwrap().push(ttl);
        if !self.ignore_updates {
            *self.target.lock().unwrap() = target.to_string();
        }
        Ok(())
    }
}
