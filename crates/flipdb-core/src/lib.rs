//! flipdb core
//!
//! Blue-green deployment of a managed database instance behind a stable DNS
//! name. A deployment alternates between two instances, `<base>-blue` and
//! `<base>-green`; each cycle restores the idle one from the source, points
//! the DNS record at it and records the swap in the descriptor.
//!
//! # Example
//!
//! ```ignore
//! use flipdb_core::{DeploySettings, DescriptorStore, Orchestrator};
//!
//! let store = DescriptorStore::new(objects, "my-bucket");
//! let mut orchestrator = Orchestrator::new(store, database, dns, DeploySettings::default());
//!
//! let outcome = orchestrator.run("orders-db", false).await?;
//! println!("now serving from {}", outcome.descriptor.current.endpoint);
//! ```

pub mod cutover;
pub mod descriptor;
pub mod error;
pub mod orchestrator;
pub mod provisioner;
pub mod role;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use cutover::DnsCutover;
pub use descriptor::{
    Descriptor, DnsConfig, InstanceRef, NewDeployment, parse_security_groups, parse_tags,
};
pub use error::{DeployError, DnsError, ProvisionError, Result, StoreError};
pub use orchestrator::{DeploySettings, Orchestrator, Outcome, OutcomeKind};
pub use provisioner::{ProvisionParams, ProvisionedInstance, Provisioner};
pub use role::Role;
pub use state::{Event, Phase, next_state};
pub use store::DescriptorStore;
