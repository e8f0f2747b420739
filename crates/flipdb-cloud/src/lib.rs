//! flipdb cloud capabilities
//!
//! This crate defines the three collaborators a blue-green database
//! deployment talks to, without binding to any vendor SDK:
//!
//! - [`DatabaseProvider`]: restore an instance from a source, describe it, delete it
//! - [`DnsProvider`]: read and repoint a single DNS record
//! - [`ObjectStore`]: get and put named blobs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   flipdb CLI                     │
//! │          (new / deploy / rollback / retire)      │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                  flipdb-core                     │
//! │   Orchestrator ─ Provisioner ─ DNS Cutover       │
//! │             Descriptor Store                     │
//! └─────────────────┬───────────────────────────────┘
//!                   │  trait objects
//! ┌─────────────────▼───────────────────────────────┐
//! │                 flipdb-cloud                     │
//! │  DatabaseProvider  DnsProvider  ObjectStore      │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │   aws (RDS,   │ │   dnsimple    │
//! │      S3)      │ │               │
//! └───────────────┘ └───────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod provider;

// Re-exports
pub use error::{CloudError, Result};
pub use memory::MemoryObjectStore;
pub use provider::{
    CreateInstanceRequest, DatabaseProvider, DnsProvider, DnsRecord, DnsRecordRef,
    InstanceDescription, InstanceStatus, ObjectStore,
};
