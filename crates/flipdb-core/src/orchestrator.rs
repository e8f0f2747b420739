//! Blue-green orchestrator
//!
//! Drives one deployment through the cutover sequence:
//!
//! ```text
//! deploy:   Idle → Provisioning → CuttingOver → Committing → Idle
//! rollback: Idle → CuttingOver → Committing → Idle
//! ```
//!
//! DNS is repointed only after the new instance is available, and the
//! descriptor is saved only after DNS has been repointed. A crash anywhere
//! before the save is recovered by re-running: provisioning reuses the
//! instance it already created and the cutover is a no-op if DNS already
//! points at it. The one unsafe seam is a failed save after a successful
//! cutover, reported as [`DeployError::CommitAfterCutover`].
//!
//! Deploy never overwrites a standby that still holds the previous release.
//! It has to be retired first, which keeps rollback pointing at what was
//! live before.

use crate::cutover::DnsCutover;
use crate::descriptor::{Descriptor, InstanceRef};
use crate::error::{DeployError, DnsError, Result};
use crate::provisioner::{ProvisionParams, Provisioner};
use crate::state::{Event, Phase, next_state};
use crate::store::DescriptorStore;
use flipdb_cloud::{DatabaseProvider, DnsProvider};
use std::sync::Arc;
use std::time::Duration;

/// Immutable settings for one orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    /// Delay between instance status checks
    pub poll_interval: Duration,
    /// Upper bound on waiting for an instance to become available
    pub provision_timeout: Duration,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            provision_timeout: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Deployed,
    RolledBack,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Deployed => write!(f, "deployed"),
            OutcomeKind::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// Result of a committed deploy or rollback
#[derive(Debug, Clone)]
pub struct Outcome {
    pub kind: OutcomeKind,
    /// Descriptor as committed
    pub descriptor: Descriptor,
    /// False when the record did not read back as the new target
    pub dns_confirmed: bool,
}

pub struct Orchestrator {
    store: DescriptorStore,
    provisioner: Provisioner,
    cutover: DnsCutover,
    phase: Phase,
    history: Vec<Phase>,
}

impl Orchestrator {
    pub fn new(
        store: DescriptorStore,
        database: Arc<dyn DatabaseProvider>,
        dns: Arc<dyn DnsProvider>,
        settings: DeploySettings,
    ) -> Self {
        Self {
            store,
            provisioner: Provisioner::new(
                database,
                settings.poll_interval,
                settings.provision_timeout,
            ),
            cutover: DnsCutover::new(dns),
            phase: Phase::Idle,
            history: vec![Phase::Idle],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase entered since construction, in order
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    pub fn store(&self) -> &DescriptorStore {
        &self.store
    }

    /// Load `name` and either deploy or roll back.
    ///
    /// Rolls back when `rollback` is set or the stored descriptor requests it.
    pub async fn run(&mut self, name: &str, rollback: bool) -> Result<Outcome> {
        let descriptor = self.store.load(name).await?;
        if rollback || descriptor.rollback_requested {
            self.rollback(name, descriptor).await
        } else {
            self.deploy(name, descriptor).await
        }
    }

    /// Provision the idle role, move DNS to it and commit the swap
    pub async fn deploy(&mut self, name: &str, descriptor: Descriptor) -> Result<Outcome> {
        let result = self.try_deploy(name, &descriptor).await;
        self.enter(name, Phase::Idle);
        result
    }

    /// Move DNS back to the previous role and commit the swap
    pub async fn rollback(&mut self, name: &str, descriptor: Descriptor) -> Result<Outcome> {
        let result = self.try_rollback(name, &descriptor).await;
        self.enter(name, Phase::Idle);
        result
    }

    /// Delete the idle instance and forget its endpoint.
    ///
    /// Refuses while DNS still targets that instance.
    pub async fn retire(&mut self, name: &str) -> Result<Descriptor> {
        let result = self.try_retire(name).await;
        self.enter(name, Phase::Idle);
        result
    }

    async fn try_deploy(&mut self, name: &str, descriptor: &Descriptor) -> Result<Outcome> {
        descriptor.validate()?;
        let (base, active) = descriptor.active_role()?;
        let idle = active.other();

        let standby = &descriptor.previous;
        if standby.is_provisioned() && standby.instance_identifier == idle.identifier(base) {
            return Err(DeployError::Validation(format!(
                "standby {} still holds the previous release; run `flipdb retire {}` first",
                standby.instance_identifier, name
            )));
        }

        tracing::info!(
            "Deploying {}: {} is active, provisioning {}",
            name,
            active,
            idle
        );

        self.enter(name, Phase::Provisioning);
        let instance = self
            .provisioner
            .provision(base, idle, &ProvisionParams::from(descriptor))
            .await?;

        self.enter(name, Phase::CuttingOver);
        let dns_confirmed = self.cut_over(descriptor, &instance.endpoint).await?;

        let next = next_state(
            descriptor,
            &Event::Deployed(InstanceRef::new(&instance.identifier, &instance.endpoint)),
        );
        self.commit(name, next, OutcomeKind::Deployed, dns_confirmed)
            .await
    }

    async fn try_rollback(&mut self, name: &str, descriptor: &Descriptor) -> Result<Outcome> {
        descriptor.validate()?;
        if !descriptor.previous.is_provisioned() {
            return Err(DeployError::Validation(format!(
                "deployment '{}' has no previous endpoint to roll back to",
                name
            )));
        }

        self.verify_standby(&descriptor.previous).await?;

        tracing::info!(
            "Rolling back {}: {} -> {}",
            name,
            descriptor.current.instance_identifier,
            descriptor.previous.instance_identifier
        );

        self.enter(name, Phase::CuttingOver);
        let dns_confirmed = self
            .cut_over(descriptor, &descriptor.previous.endpoint)
            .await?;

        let next = next_state(descriptor, &Event::RolledBack);
        self.commit(name, next, OutcomeKind::RolledBack, dns_confirmed)
            .await
    }

    async fn try_retire(&mut self, name: &str) -> Result<Descriptor> {
        let descriptor = self.store.load(name).await?;
        descriptor.validate()?;

        // The recorded endpoint is empty when a commit was lost after the
        // cutover, so the live instance is described as well
        let previous = &descriptor.previous;
        let target = self.cutover.current_target(&descriptor.dns).await?;
        let described = self
            .provisioner
            .inspect(&previous.instance_identifier)
            .await?
            .and_then(|instance| instance.endpoint);
        let serving = std::iter::once(previous.endpoint.as_str())
            .chain(described.as_deref())
            .any(|endpoint| !endpoint.is_empty() && same_host(endpoint, &target));
        if serving {
            return Err(DeployError::Validation(format!(
                "DNS record {} still points at {}; refusing to delete it",
                descriptor.dns.fqdn(),
                previous.instance_identifier
            )));
        }

        self.provisioner
            .decommission(&previous.instance_identifier)
            .await?;

        self.enter(name, Phase::Committing);
        let next = next_state(&descriptor, &Event::Retired);
        self.store.save(name, &next).await?;
        Ok(next)
    }

    /// Returns whether the cutover was confirmed by reading the record back
    async fn cut_over(&self, descriptor: &Descriptor, endpoint: &str) -> Result<bool> {
        match self.cutover.point_to(&descriptor.dns, endpoint).await {
            Ok(()) => Ok(true),
            Err(DnsError::Unconfirmed {
                record,
                expected,
                observed,
            }) => {
                tracing::warn!(
                    "DNS record {} still reads {} after update to {}; \
                     it may take a while to propagate",
                    record,
                    observed,
                    expected
                );
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn commit(
        &mut self,
        name: &str,
        next: Descriptor,
        kind: OutcomeKind,
        dns_confirmed: bool,
    ) -> Result<Outcome> {
        self.enter(name, Phase::Committing);

        if let Err(e) = self.store.save(name, &next).await {
            tracing::error!(
                "DNS for {} was switched to {} but the descriptor was not saved",
                name,
                next.current.endpoint
            );
            return Err(DeployError::CommitAfterCutover {
                name: name.to_string(),
                endpoint: next.current.endpoint.clone(),
                dns_confirmed,
                reason: e.to_string(),
            });
        }

        tracing::info!(
            "Deployment {} {}: current={} previous={}",
            name,
            kind,
            next.current.instance_identifier,
            next.previous.instance_identifier
        );
        Ok(Outcome {
            kind,
            descriptor: next,
            dns_confirmed,
        })
    }

    /// Rollback target must still exist and answer at the recorded endpoint
    async fn verify_standby(&self, standby: &InstanceRef) -> Result<()> {
        let identifier = &standby.instance_identifier;
        let instance = self.provisioner.inspect(identifier).await?.ok_or_else(|| {
            DeployError::Validation(format!("standby instance {} no longer exists", identifier))
        })?;

        if !instance.status.is_available() {
            return Err(DeployError::Validation(format!(
                "standby instance {} is {}, not available",
                identifier, instance.status
            )));
        }
        match instance.endpoint {
            Some(endpoint) if same_host(&endpoint, &standby.endpoint) => Ok(()),
            other => Err(DeployError::Validation(format!(
                "standby instance {} answers at {}, but {} is recorded",
                identifier,
                other.as_deref().unwrap_or("no endpoint"),
                standby.endpoint
            ))),
        }
    }

    fn enter(&mut self, name: &str, next: Phase) {
        if self.phase == next {
            return;
        }
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid transition {} -> {}",
            self.phase,
            next
        );
        tracing::info!("[{}] {} -> {}", name, self.phase, next);
        self.phase = next;
        self.history.push(next);
    }
}

fn same_host(a: &str, b: &str) -> bool {
    a.trim_end_matches('.') == b.trim_end_matches('.')
}
