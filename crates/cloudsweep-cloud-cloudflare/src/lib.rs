//! Cloudflare DNS adapter for cloudsweep
//!
//! Removes a cluster's public DNS records from a Cloudflare zone, or from an
//! IBM Cloud Internet Services (CIS) instance, which serves the same zone API
//! under a CRN-scoped base URL.
//!
//! # Requirements
//!
//! - Cloudflare: `CLOUDFLARE_API_TOKEN`, `CLOUDFLARE_DOMAIN` and optionally
//!   `CLOUDFLARE_ZONE_ID` env vars
//! - CIS: the instance CRN and an IBM Cloud IAM token
//!
//! # Example
//!
//! ```ignore
//! use cloudsweep_cloud::{DomainSuffixMatcher, KindRegistry};
//! use cloudsweep_cloud_cloudflare::{CIS_DNS_RECORD, CloudflareDns, DnsConfig, DnsRecordCleaner};
//!
//! let dns = CloudflareDns::new(DnsConfig::cis(crn, &token, "example.com"))?;
//! let matcher = DomainSuffixMatcher::new("mycluster", "example.com")?;
//! let cleaner = DnsRecordCleaner::new(Arc::new(dns), Arc::new(matcher));
//!
//! let mut registry = KindRegistry::new();
//! registry.register_provider(CIS_DNS_RECORD, Arc::new(cleaner))?;
//! ```

pub mod dns;
pub mod error;
pub mod provider;

pub use dns::{ApiAuth, CloudflareDns, DnsConfig, DnsRecordInfo};
pub use error::{CloudflareError, Result};
pub use provider::{CIS_DNS_RECORD, DnsRecordCleaner, RecordStore};
