//! Turns cluster metadata into the kind registries that get reconciled

use anyhow::{Context, bail};
use cloudsweep_cloud::{DomainSuffixMatcher, KindRegistry, NamePatternMatcher};
use cloudsweep_cloud_cloudflare::{CIS_DNS_RECORD, CloudflareDns, DnsConfig, DnsRecordCleaner};
use cloudsweep_cloud_ibm::{
    DnsServices, DnsServicesConfig, IBM_DNS_RECORD, PERMITTED_NETWORK, PermittedNetworkCleaner,
    ResourceRecordCleaner, VpcClient,
};
use cloudsweep_config::ClusterMetadata;
use std::sync::Arc;

/// Credentials gathered from flags and the environment
#[derive(Default, Clone)]
pub struct Credentials {
    pub iam_token: Option<String>,
    pub cloudflare_token: Option<String>,
}

impl Credentials {
    fn iam_token(&self, purpose: &str) -> anyhow::Result<&str> {
        self.iam_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .with_context(|| format!("an IBM Cloud IAM token is required for {} (--iam-token or IBMCLOUD_IAM_TOKEN)", purpose))
    }
}

/// One independently reconciled group of kinds
pub struct Family {
    pub name: &'static str,
    pub registry: KindRegistry,
}

pub fn build(metadata: &ClusterMetadata, credentials: &Credentials) -> anyhow::Result<Vec<Family>> {
    let powervs = metadata.powervs()?;
    let domain = DomainSuffixMatcher::new(&metadata.cluster_name, &powervs.base_domain)?;
    let domain = Arc::new(domain);
    let mut families = Vec::new();

    let public = match credentials.cloudflare_token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => Some(DnsConfig::cloudflare(token, None, powervs.base_domain.as_str())),
        None if powervs.has_public_dns() => Some(DnsConfig::cis(
            powervs.cis_instance_crn.as_str(),
            credentials.iam_token("CIS DNS records")?,
            powervs.base_domain.as_str(),
        )),
        None => None,
    };

    if let Some(config) = public {
        let dns = CloudflareDns::new(config)?;
        let mut registry = KindRegistry::new();
        registry.register_provider(
            CIS_DNS_RECORD,
            Arc::new(DnsRecordCleaner::new(Arc::new(dns), domain.clone())),
        )?;
        families.push(Family {
            name: "public-dns",
            registry,
        });
    }

    if powervs.has_private_dns() {
        let token = credentials.iam_token("DNS Services")?;
        let config =
            DnsServicesConfig::from_crn(&powervs.dns_instance_crn, token, powervs.base_domain.as_str())?;
        let zone = Arc::new(DnsServices::new(config)?);
        let vpcs = Arc::new(VpcClient::new(&powervs.vpc_region, token)?);
        let owner = NamePatternMatcher::new(&metadata.infra_id, powervs.vpc_name.clone())?;

        let mut records = KindRegistry::new();
        records.register_provider(
            IBM_DNS_RECORD,
            Arc::new(ResourceRecordCleaner::new(zone.clone(), domain)),
        )?;
        families.push(Family {
            name: "private-dns",
            registry: records,
        });

        let mut networks = KindRegistry::new();
        networks.register_provider(
            PERMITTED_NETWORK,
            Arc::new(PermittedNetworkCleaner::new(
                zone,
                vpcs,
                Arc::new(owner),
                powervs.vpc_region.as_str(),
            )),
        )?;
        families.push(Family {
            name: "permitted-networks",
            registry: networks,
        });
    }

    if families.is_empty() {
        bail!("metadata names no DNS instance to clean up");
    }

    Ok(families)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CIS_CRN: &str = "crn:v1:bluemix:public:internet-svcs:global:a/1234abcd:cis-1::";
    const DNS_CRN: &str = "crn:v1:bluemix:public:dns-svcs:global:a/1234abcd:dns-1::";

    fn metadata(cis: &str, dns: &str) -> ClusterMetadata {
        let json = serde_json::json!({
            "clusterName": "mycluster",
            "clusterID": "id",
            "infraID": "mycluster-x7k2p",
            "powervs": {
                "BaseDomain": "example.com",
                "cisInstanceCRN": cis,
                "dnsInstanceCRN": dns,
                "vpcRegion": "us-south",
                "vpcName": "byo-vpc"
            }
        });
        serde_json::from_value(json).unwrap()
    }

    fn iam() -> Credentials {
        Credentials {
            iam_token: Some("tok".to_string()),
            cloudflare_token: None,
        }
    }

    fn names(families: &[Family]) -> Vec<&'static str> {
        families.iter().map(|f| f.name).collect()
    }

    #[test]
    fn test_public_cluster() {
        let families = build(&metadata(CIS_CRN, ""), &iam()).unwrap();
        assert_eq!(names(&families), vec!["public-dns"]);
        assert_eq!(families[0].registry.kinds(), vec![CIS_DNS_RECORD]);
    }

    #[test]
    fn test_private_cluster() {
        let families = build(&metadata("", DNS_CRN), &iam()).unwrap();
        assert_eq!(names(&families), vec!["private-dns", "permitted-networks"]);
        assert_eq!(families[1].registry.kinds(), vec![PERMITTED_NETWORK]);
    }

    #[test]
    fn test_cloudflare_token_replaces_cis() {
        let credentials = Credentials {
            iam_token: None,
            cloudflare_token: Some("cf".to_string()),
        };
        let families = build(&metadata(CIS_CRN, ""), &credentials).unwrap();
        assert_eq!(names(&families), vec!["public-dns"]);
    }

    #[test]
    fn test_missing_iam_token() {
        let err = build(&metadata(CIS_CRN, ""), &Credentials::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("IBMCLOUD_IAM_TOKEN"));
    }

    #[test]
    fn test_malformed_dns_crn() {
        assert!(build(&metadata("", "crn:v1:oops"), &iam()).is_err());
    }
}
