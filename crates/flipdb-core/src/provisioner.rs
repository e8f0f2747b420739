//! Instance provisioning
//!
//! Restores the idle role's instance from the deployment source and waits
//! until the provider reports it available. The target identifier is derived
//! from the base name and role, so a retry after a crash finds the instance
//! the previous run created instead of creating a second one.

use crate::descriptor::Descriptor;
use crate::error::ProvisionError;
use crate::role::Role;
use flipdb_cloud::{CreateInstanceRequest, DatabaseProvider, InstanceDescription};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};

type Result<T> = std::result::Result<T, ProvisionError>;

const MODIFY_PICKUP_POLLS: u32 = 10;

/// Fixed parameters applied to every new instance of a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionParams {
    pub source_identifier: String,
    pub instance_class: String,
    pub availability_zone: String,
    pub subnet_group_name: String,
    pub publicly_accessible: bool,
    pub security_group_ids: BTreeSet<String>,
    pub tags: BTreeMap<String, String>,
    pub master_password: String,
}

impl From<&Descriptor> for ProvisionParams {
    fn from(descriptor: &Descriptor) -> Self {
        Self {
            source_identifier: descriptor.source_instance_identifier.clone(),
            instance_class: descriptor.instance_class.clone(),
            availability_zone: descriptor.availability_zone.clone(),
            subnet_group_name: descriptor.subnet_group_name.clone(),
            publicly_accessible: descriptor.publicly_accessible,
            security_group_ids: descriptor.security_group_ids.clone(),
            tags: descriptor.instance_tags.clone(),
            master_password: descriptor.master_password.clone(),
        }
    }
}

/// An instance that is available and reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedInstance {
    pub identifier: String,
    pub endpoint: String,
    /// False when an existing instance was reused
    pub created: bool,
}

pub struct Provisioner {
    database: Arc<dyn DatabaseProvider>,
    poll_interval: Duration,
    timeout: Duration,
}

impl Provisioner {
    pub fn new(
        database: Arc<dyn DatabaseProvider>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            database,
            poll_interval,
            timeout,
        }
    }

    /// Bring the instance for `role` under `base` into an available state.
    ///
    /// An instance that already exists is reused, and a non-empty master
    /// password is applied whether or not the instance was created by this
    /// call. Callers must not pass the role of an instance that is still
    /// recorded as serving or standing by.
    pub async fn provision(
        &self,
        base: &str,
        role: Role,
        params: &ProvisionParams,
    ) -> Result<ProvisionedInstance> {
        let identifier = role.identifier(base);

        let (endpoint, created) = match self.inspect(&identifier).await? {
            Some(existing) => {
                if existing.status.is_terminal() {
                    return Err(ProvisionError::InstanceFailed {
                        identifier,
                        status: existing.status.to_string(),
                    });
                }

                tracing::info!(
                    "Instance {} already exists ({}), reusing it",
                    identifier,
                    existing.status
                );
                let endpoint = match reachable_endpoint(&existing) {
                    Some(endpoint) => endpoint,
                    None => self.wait_until_available(&identifier).await?,
                };
                (endpoint, false)
            }
            None => {
                self.create(&identifier, params).await?;
                (self.wait_until_available(&identifier).await?, true)
            }
        };

        let endpoint = if params.master_password.is_empty() {
            endpoint
        } else {
            self.apply_master_password(&identifier, &params.master_password)
                .await?
        };

        Ok(ProvisionedInstance {
            identifier,
            endpoint,
            created,
        })
    }

    /// Describe an instance without waiting
    pub async fn inspect(&self, identifier: &str) -> Result<Option<InstanceDescription>> {
        self.database
            .describe(identifier)
            .await
            .map_err(|e| ProvisionError::ProviderRejected(e.to_string()))
    }

    async fn create(&self, identifier: &str, params: &ProvisionParams) -> Result<()> {
        let request = CreateInstanceRequest {
            identifier: identifier.to_string(),
            source_identifier: params.source_identifier.clone(),
            instance_class: params.instance_class.clone(),
            availability_zone: params.availability_zone.clone(),
            subnet_group_name: params.subnet_group_name.clone(),
            publicly_accessible: params.publicly_accessible,
            security_group_ids: params.security_group_ids.clone(),
            tags: params.tags.clone(),
        };

        tracing::info!(
            "Creating {} from {} via {}",
            identifier,
            params.source_identifier,
            self.database.name()
        );
        self.database
            .create_from_source(&request)
            .await
            .map_err(|e| ProvisionError::ProviderRejected(e.to_string()))
    }

    /// Modify the password, then wait for the instance to settle again
    async fn apply_master_password(&self, identifier: &str, password: &str) -> Result<String> {
        tracing::info!("Applying master password to {}", identifier);
        self.database
            .set_master_password(identifier, password)
            .await
            .map_err(|e| ProvisionError::ProviderRejected(e.to_string()))?;

        self.wait_until_modifying(identifier).await?;
        self.wait_until_available(identifier).await
    }

    /// The provider reports `available` for a while after accepting a
    /// modification. Poll until the status changes, for at most
    /// `MODIFY_PICKUP_POLLS` polls and never past the provisioning timeout.
    async fn wait_until_modifying(&self, identifier: &str) -> Result<()> {
        let deadline = Instant::now() + self.timeout;

        for _ in 0..MODIFY_PICKUP_POLLS {
            sleep(self.poll_interval).await;
            match self.inspect(identifier).await? {
                Some(instance) if instance.status.is_available() => {}
                Some(instance) => {
                    tracing::debug!("Instance {} is {}", identifier, instance.status);
                    return Ok(());
                }
                None => return Ok(()),
            }
            if Instant::now() >= deadline {
                break;
            }
        }

        tracing::debug!(
            "Instance {} still reports available after the modification",
            identifier
        );
        Ok(())
    }

    /// Delete an idle instance. Already-missing instances are not an error.
    pub async fn decommission(&self, identifier: &str) -> Result<()> {
        match self.database.delete(identifier).await {
            Ok(()) => {
                tracing::info!("Deleted instance {}", identifier);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("Instance {} already gone", identifier);
                Ok(())
            }
            Err(e) => Err(ProvisionError::ProviderRejected(e.to_string())),
        }
    }

    /// Poll at a fixed interval until available, failed, or timed out
    async fn wait_until_available(&self, identifier: &str) -> Result<String> {
        let deadline = Instant::now() + self.timeout;

        loop {
            match self.inspect(identifier).await? {
                Some(instance) => {
                    if let Some(endpoint) = reachable_endpoint(&instance) {
                        tracing::info!("Instance {} is available at {}", identifier, endpoint);
                        return Ok(endpoint);
                    }
                    if instance.status.is_terminal() {
                        return Err(ProvisionError::InstanceFailed {
                            identifier: identifier.to_string(),
                            status: instance.status.to_string(),
                        });
                    }
                    tracing::debug!("Instance {} is {}", identifier, instance.status);
                }
                None => tracing::debug!("Instance {} not visible yet", identifier),
            }

            if Instant::now() >= deadline {
                return Err(ProvisionError::Timeout {
                    identifier: identifier.to_string(),
                    waited: self.timeout,
                });
            }
            sleep(self.poll_interval).await;
        }
    }
}

fn reachable_endpoint(instance: &InstanceDescription) -> Option<String> {
    if !instance.status.is_available() {
        return None;
    }
    instance.endpoint.clone().filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeDatabase, sample_descriptor};

    fn provisioner(database: Arc<FakeDatabase>) -> Provisioner {
        Provisioner::new(database, Duration::from_millis(1), Duration::from_millis(50))
    }

    fn params() -> ProvisionParams {
        ProvisionParams::from(&sample_descriptor())
    }

    #[tokio::test]
    async fn test_provision_creates_and_waits() {
        let database = Arc::new(FakeDatabase::new().becomes_available_after(3));
        let instance = provisioner(database.clone())
            .provision("orders", Role::Green, &params())
            .await
            .unwrap();

        assert_eq!(instance.identifier, "orders-green");
        assert_eq!(instance.endpoint, "orders-green.rds.example");
        assert!(instance.created);
        assert_eq!(database.creates(), vec!["orders-green".to_string()]);

        let request = database.last_request().unwrap();
        assert_eq!(request.source_identifier, "orders-db-src");
        assert_eq!(request.instance_class, "db.m3.medium");
        assert!(request.security_group_ids.contains("sg-1"));
        assert_eq!(request.tags.get("team").map(String::as_str), Some("orders"));
    }

    #[tokio::test]
    async fn test_provision_applies_master_password() {
        let database = Arc::new(FakeDatabase::new());
        provisioner(database.clone())
            .provision("orders", Role::Green, &params())
            .await
            .unwrap();

        assert!(database.calls().contains(&Call::SetPassword("orders-green".into())));
    }

    #[tokio::test]
    async fn test_password_applied_to_reused_instance() {
        let database = Arc::new(FakeDatabase::new().becomes_available_after(1));

        // Zero timeout: the first attempt gives up right after the create
        let err = Provisioner::new(database.clone(), Duration::from_millis(1), Duration::ZERO)
            .provision("orders", Role::Green, &params())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Timeout { .. }));
        assert!(!database.calls().contains(&Call::SetPassword("orders-green".into())));

        let instance = provisioner(database.clone())
            .provision("orders", Role::Green, &params())
            .await
            .unwrap();

        assert!(!instance.created);
        assert_eq!(database.creates().len(), 1);
        assert!(database.calls().contains(&Call::SetPassword("orders-green".into())));
    }

    #[tokio::test]
    async fn test_password_waits_for_modification_to_start() {
        let database = Arc::new(FakeDatabase::new().password_reset_after(3));
        provisioner(database.clone())
            .provision("orders", Role::Green, &params())
            .await
            .unwrap();

        let calls = database.calls();
        let reset = calls
            .iter()
            .position(|c| *c == Call::SetPassword("orders-green".into()))
            .unwrap();
        let statuses: Vec<Option<String>> = calls[reset..]
            .iter()
            .filter_map(|c| match c {
                Call::Describe { status, .. } => Some(status.clone()),
                _ => None,
            })
            .collect();

        assert!(statuses.contains(&Some("modifying".to_string())));
        assert_eq!(statuses.last().cloned().flatten().as_deref(), Some("available"));
    }

    #[tokio::test]
    async fn test_provision_skips_empty_password() {
        let database = Arc::new(FakeDatabase::new());
        let mut params = params();
        params.master_password.clear();

        provisioner(database.clone())
            .provision("orders", Role::Green, &params)
            .await
            .unwrap();

        assert!(
            !database
                .calls()
                .iter()
                .any(|c| matches!(c, Call::SetPassword(_)))
        );
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let database = Arc::new(FakeDatabase::new());
        let provisioner = provisioner(database.clone());

        let first = provisioner
            .provision("orders", Role::Green, &params())
            .await
            .unwrap();
        let second = provisioner
            .provision("orders", Role::Green, &params())
            .await
            .unwrap();

        assert_eq!(first.endpoint, second.endpoint);
        assert!(!second.created);
        assert_eq!(database.creates().len(), 1);
    }

    #[tokio::test]
    async fn test_provision_waits_for_pending_existing_instance() {
        let database = Arc::new(FakeDatabase::new().becomes_available_after(2));
        database.insert_pending("orders-green");

        let instance = provisioner(database.clone())
            .provision("orders", Role::Green, &params())
            .await
            .unwrap();

        assert!(!instance.created);
        assert!(database.creates().is_empty());
    }

    #[tokio::test]
    async fn test_provision_timeout() {
        let database = Arc::new(FakeDatabase::new().never_available());
        let err = provisioner(database)
            .provision("orders", Role::Green, &params())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::Timeout { ref identifier, .. } if identifier == "orders-green"
        ));
    }

    #[tokio::test]
    async fn test_provision_failed_status() {
        let database = Arc::new(FakeDatabase::new().fails_with("failed"));
        let err = provisioner(database)
            .provision("orders", Role::Green, &params())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::InstanceFailed { ref status, .. } if status == "failed"
        ));
    }

    #[tokio::test]
    async fn test_provision_rejected() {
        let database = Arc::new(FakeDatabase::new().rejects_create());
        let err = provisioner(database)
            .provision("orders", Role::Green, &params())
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::ProviderRejected(_)));
    }

    #[tokio::test]
    async fn test_decommission_tolerates_missing_instance() {
        let database = Arc::new(FakeDatabase::new());
        provisioner(database.clone())
            .decommission("orders-green")
            .await
            .unwrap();

        assert!(database.calls().contains(&Call::Delete("orders-green".into())));
    }
}
