//! DNSimple provider for flipdb
//!
//! Implements [`flipdb_cloud::DnsProvider`] against the DNSimple v2 API.
//! The API token travels with each [`flipdb_cloud::DnsRecordRef`], since
//! every deployment descriptor carries its own credentials.
//!
//! # Example
//!
//! ```ignore
//! use flipdb_cloud::{DnsProvider, DnsRecordRef};
//! use flipdb_cloud_dnsimple::DnsimpleClient;
//!
//! let dns = DnsimpleClient::new();
//! let record = DnsRecordRef {
//!     auth_token: token,
//!     account_id: "1010".into(),
//!     domain: "example.com".into(),
//!     record_id: 42,
//! };
//!
//! dns.update_record(&record, "orders-green.xxxx.rds.amazonaws.com", 60).await?;
//! let current = dns.get_record(&record).await?;
//! ```

pub mod client;
pub mod error;

pub use client::{DnsimpleClient, SANDBOX_API_BASE};
pub use error::{DnsimpleError, Result};
