//! Private DNS teardown: resource records and permitted networks

use crate::crn::Crn;
use crate::dns_svcs::{DnsServices, PermittedNetwork, ResourceRecord};
use crate::error::{IbmError, Result};
use crate::vpc::{Vpc, VpcClient};
use async_trait::async_trait;
use cloudsweep_cloud::{
    ClusterPredicate, DeleteOutcome, Deleter, Enumerator, ResourceDescriptor, ResourceKind,
    ResourceSet,
};
use std::sync::Arc;

/// Kind label for records in a DNS Services private zone
pub const IBM_DNS_RECORD: ResourceKind = ResourceKind::new("ibm dns record");

/// Kind label for VPCs permitted to resolve the private zone
pub const PERMITTED_NETWORK: ResourceKind = ResourceKind::new("permitted network");

/// The private zone operations teardown needs
#[async_trait]
pub trait PrivateZone: Send + Sync {
    async fn list_resource_records(&self) -> Result<Vec<ResourceRecord>>;
    async fn get_resource_record(&self, record_id: &str) -> Result<ResourceRecord>;
    async fn delete_resource_record(&self, record_id: &str) -> Result<()>;
    async fn list_permitted_networks(&self) -> Result<Vec<PermittedNetwork>>;
    async fn delete_permitted_network(&self, network_id: &str) -> Result<()>;
}

#[async_trait]
impl PrivateZone for DnsServices {
    async fn list_resource_records(&self) -> Result<Vec<ResourceRecord>> {
        DnsServices::list_resource_records(self).await
    }

    async fn get_resource_record(&self, record_id: &str) -> Result<ResourceRecord> {
        DnsServices::get_resource_record(self, record_id).await
    }

    async fn delete_resource_record(&self, record_id: &str) -> Result<()> {
        DnsServices::delete_resource_record(self, record_id).await
    }

    async fn list_permitted_networks(&self) -> Result<Vec<PermittedNetwork>> {
        DnsServices::list_permitted_networks(self).await
    }

    async fn delete_permitted_network(&self, network_id: &str) -> Result<()> {
        DnsServices::delete_permitted_network(self, network_id).await
    }
}

#[async_trait]
pub trait VpcLookup: Send + Sync {
    async fn get_vpc(&self, vpc_id: &str) -> Result<Vpc>;
}

#[async_trait]
impl VpcLookup for VpcClient {
    async fn get_vpc(&self, vpc_id: &str) -> Result<Vpc> {
        VpcClient::get_vpc(self, vpc_id).await
    }
}

fn classify(err: IbmError) -> cloudsweep_cloud::Result<DeleteOutcome> {
    match err.status() {
        Some(404) => Ok(DeleteOutcome::AlreadyGone),
        Some(status) if status >= 500 => Ok(DeleteOutcome::Transient(err.to_string())),
        _ => Err(err.into()),
    }
}

/// Enumerates and deletes the cluster's records in the private zone
pub struct ResourceRecordCleaner {
    zone: Arc<dyn PrivateZone>,
    predicate: Arc<dyn ClusterPredicate>,
}

impl ResourceRecordCleaner {
    pub fn new(zone: Arc<dyn PrivateZone>, predicate: Arc<dyn ClusterPredicate>) -> Self {
        Self { zone, predicate }
    }
}

#[async_trait]
impl Enumerator for ResourceRecordCleaner {
    async fn enumerate(&self) -> cloudsweep_cloud::Result<ResourceSet> {
        let records = self.zone.list_resource_records().await?;

        let matched: ResourceSet = records
            .iter()
            .filter(|r| self.predicate.matches(&r.name))
            .map(|r| {
                tracing::debug!(kind = %IBM_DNS_RECORD, key = %r.id, name = %r.name, "Found");
                ResourceDescriptor::new(IBM_DNS_RECORD, r.id.as_str(), r.name.as_str())
                    .with_status(r.record_type.as_str())
            })
            .collect();

        if matched.is_empty() && !records.is_empty() {
            let seen: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
            tracing::debug!(kind = %IBM_DNS_RECORD, seen = ?seen, "No records matched the cluster domain");
        }

        Ok(matched)
    }
}

#[async_trait]
impl Deleter for ResourceRecordCleaner {
    async fn delete(&self, item: &ResourceDescriptor) -> cloudsweep_cloud::Result<DeleteOutcome> {
        if let Err(e) = self.zone.get_resource_record(&item.provider_id).await {
            return classify(e);
        }

        match self.zone.delete_resource_record(&item.provider_id).await {
            Ok(()) => Ok(DeleteOutcome::Requested),
            Err(e) => classify(e),
        }
    }
}

/// Enumerates and removes the cluster's VPCs from the zone's permitted networks
pub struct PermittedNetworkCleaner {
    zone: Arc<dyn PrivateZone>,
    vpcs: Arc<dyn VpcLookup>,
    predicate: Arc<dyn ClusterPredicate>,
    vpc_region: String,
}

impl PermittedNetworkCleaner {
    /// Only networks whose VPC lives in `vpc_region` are considered
    pub fn new(
        zone: Arc<dyn PrivateZone>,
        vpcs: Arc<dyn VpcLookup>,
        predicate: Arc<dyn ClusterPredicate>,
        vpc_region: impl Into<String>,
    ) -> Self {
        Self {
            zone,
            vpcs,
            predicate,
            vpc_region: vpc_region.into(),
        }
    }
}

#[async_trait]
impl Enumerator for PermittedNetworkCleaner {
    async fn enumerate(&self) -> cloudsweep_cloud::Result<ResourceSet> {
        let networks = self.zone.list_permitted_networks().await?;
        let mut matched = Vec::new();

        for network in &networks {
            let vpc_crn = Crn::parse(&network.permitted_network.vpc_crn)?;
            if vpc_crn.region != self.vpc_region {
                tracing::debug!(
                    kind = %PERMITTED_NETWORK,
                    key = %network.id,
                    region = %vpc_crn.region,
                    "Skipping network outside the VPC region"
                );
                continue;
            }

            // A permitted network's id is the id of the VPC it refers to
            let vpc = self.vpcs.get_vpc(&network.id).await?;
            if self.predicate.matches(&vpc.name) {
                tracing::debug!(kind = %PERMITTED_NETWORK, key = %vpc.id, name = %vpc.name, "Found");
                let mut descriptor = ResourceDescriptor::new(PERMITTED_NETWORK, vpc.id, vpc.name)
                    .with_provider_id(network.id.as_str());
                descriptor.status = network.state.clone();
                matched.push(descriptor);
            }
        }

        Ok(ResourceSet::new().insert(matched))
    }
}

#[async_trait]
impl Deleter for PermittedNetworkCleaner {
    async fn delete(&self, item: &ResourceDescriptor) -> cloudsweep_cloud::Result<DeleteOutcome> {
        match self.zone.delete_permitted_network(&item.provider_id).await {
            Ok(()) => Ok(DeleteOutcome::Requested),
            Err(e) => classify(e),
        }
    }
}
