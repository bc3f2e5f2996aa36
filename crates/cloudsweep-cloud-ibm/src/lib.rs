//! IBM Cloud DNS Services adapter for cloudsweep
//!
//! Removes a cluster's private DNS footprint: the resource records in the
//! DNS Services zone and the cluster VPC's permission to resolve that zone.
//!
//! # Example
//!
//! ```ignore
//! use cloudsweep_cloud::{DomainSuffixMatcher, KindRegistry, NamePatternMatcher};
//! use cloudsweep_cloud_ibm::*;
//!
//! let zone = Arc::new(DnsServices::new(DnsServicesConfig::from_crn(crn, &token, "example.com")?)?);
//! let vpcs = Arc::new(VpcClient::new("us-south", &token)?);
//!
//! let records = ResourceRecordCleaner::new(zone.clone(), Arc::new(DomainSuffixMatcher::new("mycluster", "example.com")?));
//! let networks = PermittedNetworkCleaner::new(zone, vpcs, Arc::new(NamePatternMatcher::new(infra_id, None)?), "us-south");
//!
//! let mut registry = KindRegistry::new();
//! registry.register_provider(IBM_DNS_RECORD, Arc::new(records))?;
//! registry.register_provider(PERMITTED_NETWORK, Arc::new(networks))?;
//! ```

pub mod crn;
pub mod dns_svcs;
pub mod error;
pub mod provider;
pub mod vpc;

pub use crn::Crn;
pub use dns_svcs::{DnsServices, DnsServicesConfig, PermittedNetwork, ResourceRecord};
pub use error::{IbmError, Result};
pub use provider::{
    IBM_DNS_RECORD, PERMITTED_NETWORK, PermittedNetworkCleaner, PrivateZone, ResourceRecordCleaner,
    VpcLookup,
};
pub use vpc::{Vpc, VpcClient};
