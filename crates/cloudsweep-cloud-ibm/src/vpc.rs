//! Regional VPC API lookups

use crate::dns_svcs::{decode, http_client, strip_bearer};
use crate::error::{IbmError, Result};
use reqwest::Url;
use serde::Deserialize;

/// API version date sent with every VPC request
pub const VPC_API_VERSION: &str = "2024-04-30";

/// A VPC as returned by the regional API
#[derive(Debug, Clone, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub crn: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Client for one region's VPC API
pub struct VpcClient {
    client: reqwest::Client,
    api_base: Url,
    iam_token: String,
}

impl VpcClient {
    /// `https://<region>.iaas.cloud.ibm.com/v1`
    pub fn new(region: &str, iam_token: &str) -> Result<Self> {
        if region.is_empty() {
            return Err(IbmError::InvalidConfig("VPC region must not be empty".to_string()));
        }
        Self::with_api_base(&format!("https://{}.iaas.cloud.ibm.com/v1", region), iam_token)
    }

    pub fn with_api_base(api_base: &str, iam_token: &str) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| IbmError::InvalidConfig(format!("invalid VPC API base {}: {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(IbmError::InvalidConfig(format!(
                "VPC API base cannot carry a path: {}",
                api_base
            )));
        }

        Ok(Self {
            client: http_client()?,
            api_base,
            iam_token: strip_bearer(iam_token).to_string(),
        })
    }

    pub fn vpc_url(&self, vpc_id: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| IbmError::InvalidConfig("VPC API base cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("vpcs")
            .push(vpc_id);
        url.query_pairs_mut()
            .append_pair("version", VPC_API_VERSION)
            .append_pair("generation", "2");
        Ok(url)
    }

    pub async fn get_vpc(&self, vpc_id: &str) -> Result<Vpc> {
        let response = self
            .client
            .get(self.vpc_url(vpc_id)?)
            .bearer_auth(&self.iam_token)
            .send()
            .await?;
        decode(response).await
    }
}
