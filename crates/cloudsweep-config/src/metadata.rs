//! Installer `metadata.json`

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cluster identity written by the installer, enough to find what to tear down
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetadata {
    pub cluster_name: String,
    #[serde(rename = "clusterID", default)]
    pub cluster_id: String,
    #[serde(rename = "infraID")]
    pub infra_id: String,
    #[serde(default)]
    pub powervs: Option<PowerVsMetadata>,
}

/// Platform section for Power VS clusters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerVsMetadata {
    #[serde(rename = "BaseDomain")]
    pub base_domain: String,
    /// CIS instance serving the public zone; empty for private clusters
    #[serde(rename = "cisInstanceCRN", default)]
    pub cis_instance_crn: String,
    /// DNS Services instance serving the private zone; empty for public clusters
    #[serde(rename = "dnsInstanceCRN", default)]
    pub dns_instance_crn: String,
    #[serde(rename = "powerVSResourceGroup", default)]
    pub resource_group: String,
    #[serde(default)]
    pub region: String,
    #[serde(rename = "vpcRegion", default)]
    pub vpc_region: String,
    #[serde(rename = "vpcName", default, skip_serializing_if = "Option::is_none")]
    pub vpc_name: Option<String>,
    #[serde(default)]
    pub zone: String,
    #[serde(rename = "serviceInstanceID", default)]
    pub service_instance_id: String,
}

impl ClusterMetadata {
    /// Read and validate a metadata file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let metadata: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cluster_name.is_empty() {
            return Err(ConfigError::Invalid("clusterName is empty".to_string()));
        }
        if self.infra_id.is_empty() {
            return Err(ConfigError::Invalid("infraID is empty".to_string()));
        }

        if let Some(powervs) = &self.powervs {
            if powervs.base_domain.is_empty() {
                return Err(ConfigError::Invalid("powervs.BaseDomain is empty".to_string()));
            }
            if powervs.cis_instance_crn.is_empty() && powervs.dns_instance_crn.is_empty() {
                return Err(ConfigError::Invalid(
                    "one of powervs.cisInstanceCRN or powervs.dnsInstanceCRN is required".to_string(),
                ));
            }
            if !powervs.dns_instance_crn.is_empty() && powervs.vpc_region.is_empty() {
                return Err(ConfigError::Invalid(
                    "powervs.vpcRegion is required with a DNS Services instance".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn powervs(&self) -> Result<&PowerVsMetadata> {
        self.powervs
            .as_ref()
            .ok_or_else(|| ConfigError::Invalid("no powervs platform section".to_string()))
    }
}

impl PowerVsMetadata {
    /// `<clusterName>.<BaseDomain>`
    pub fn cluster_domain(&self, cluster_name: &str) -> String {
        format!("{}.{}", cluster_name, self.base_domain)
    }

    /// Public records live in CIS
    pub fn has_public_dns(&self) -> bool {
        !self.cis_instance_crn.is_empty()
    }

    /// Private records and permitted networks live in DNS Services
    pub fn has_private_dns(&self) -> bool {
        !self.dns_instance_crn.is_empty()
    }
}
