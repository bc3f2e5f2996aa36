//! IBM Cloud DNS Services API client
//!
//! Private zones, their resource records and the VPCs permitted to resolve
//! them. Every call is scoped to one service instance (taken from the
//! instance CRN) and one zone.

use crate::crn::Crn;
use crate::error::{IbmError, Result};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Upper bound on any single API request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const DNS_SVCS_API_BASE: &str = "https://api.dns-svcs.cloud.ibm.com/v1";

/// Page size for list calls
pub const PAGE_LIMIT: u32 = 200;

/// Configuration for the DNS Services client
#[derive(Clone)]
pub struct DnsServicesConfig {
    pub api_base: String,
    pub iam_token: String,
    /// Service instance GUID
    pub instance_id: String,
    /// Zone to operate on; resolved from `domain` when absent
    pub zone_id: Option<String>,
    /// Private zone name, e.g. `example.com`
    pub domain: String,
}

impl std::fmt::Debug for DnsServicesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsServicesConfig")
            .field("api_base", &self.api_base)
            .field("iam_token", &"***")
            .field("instance_id", &self.instance_id)
            .field("zone_id", &self.zone_id)
            .field("domain", &self.domain)
            .finish()
    }
}

impl DnsServicesConfig {
    /// Build a config from the DNS instance CRN
    pub fn from_crn(instance_crn: &str, iam_token: &str, domain: impl Into<String>) -> Result<Self> {
        let crn = Crn::parse(instance_crn)?;
        if crn.service_instance.is_empty() {
            return Err(IbmError::invalid_crn(instance_crn, "missing service instance"));
        }

        Ok(Self {
            api_base: DNS_SVCS_API_BASE.to_string(),
            iam_token: strip_bearer(iam_token).to_string(),
            instance_id: crn.service_instance,
            zone_id: None,
            domain: domain.into(),
        })
    }

    /// Create DnsServicesConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("IBMCLOUD_IAM_TOKEN")
            .map_err(|_| IbmError::MissingEnvVar("IBMCLOUD_IAM_TOKEN".to_string()))?;
        let crn = std::env::var("IBM_DNS_INSTANCE_CRN")
            .map_err(|_| IbmError::MissingEnvVar("IBM_DNS_INSTANCE_CRN".to_string()))?;
        let domain = std::env::var("IBM_DNS_DOMAIN")
            .map_err(|_| IbmError::MissingEnvVar("IBM_DNS_DOMAIN".to_string()))?;

        let mut config = Self::from_crn(&crn, &token, domain)?;
        config.zone_id = std::env::var("IBM_DNS_ZONE_ID").ok();
        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_zone_id(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }
}

pub(crate) fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

pub(crate) fn strip_bearer(token: &str) -> &str {
    token.strip_prefix("Bearer ").unwrap_or(token)
}

/// DNS Services client bound to one instance and zone
pub struct DnsServices {
    client: reqwest::Client,
    api_base: Url,
    iam_token: String,
    instance_id: String,
    domain: String,
    zone_id: OnceCell<String>,
}

impl DnsServices {
    pub fn new(config: DnsServicesConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            IbmError::InvalidConfig(format!("invalid API base {}: {}", config.api_base, e))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(IbmError::InvalidConfig(format!(
                "API base cannot carry a path: {}",
                config.api_base
            )));
        }

        Ok(Self {
            client: http_client()?,
            api_base,
            iam_token: config.iam_token,
            instance_id: config.instance_id,
            domain: config.domain,
            zone_id: OnceCell::new_with(config.zone_id),
        })
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `<base>/instances/<instance>/<segments...>`
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| IbmError::InvalidConfig("API base cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("instances")
            .push(&self.instance_id)
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, page: Option<u32>) -> Result<T> {
        let mut request = self.client.get(url).bearer_auth(&self.iam_token);
        if let Some(offset) = page {
            request = request.query(&[("offset", offset), ("limit", PAGE_LIMIT)]);
        }
        decode(request.send().await?).await
    }

    async fn delete(&self, url: Url) -> Result<()> {
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.iam_token)
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    /// Walk every page of an offset/limit listing
    async fn list_all<P: Page + DeserializeOwned>(&self, segments: &[&str]) -> Result<Vec<P::Item>> {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let page: P = self.get(self.endpoint(segments)?, Some(offset)).await?;
            let info = page.info();
            let more = info.has_more();
            items.extend(page.into_items());
            if !more {
                break;
            }
            offset = info.offset + info.count;
        }

        Ok(items)
    }

    /// Zone id, resolved once from the domain unless configured up front
    pub async fn zone_id(&self) -> Result<&str> {
        let id = self
            .zone_id
            .get_or_try_init(|| self.find_zone_id())
            .await?;
        Ok(id.as_str())
    }

    async fn find_zone_id(&self) -> Result<String> {
        let zones = self.list_all::<ZoneList>(&["dnszones"]).await?;
        zones
            .into_iter()
            .find(|zone| zone.name == self.domain)
            .map(|zone| {
                tracing::debug!("Resolved DNS zone {} -> {}", zone.name, zone.id);
                zone.id
            })
            .ok_or_else(|| IbmError::ZoneNotFound(self.domain.clone()))
    }

    /// List all resource records in the zone
    pub async fn list_resource_records(&self) -> Result<Vec<ResourceRecord>> {
        let zone_id = self.zone_id().await?;
        self.list_all::<ResourceRecordList>(&["dnszones", zone_id, "resource_records"])
            .await
    }

    pub async fn get_resource_record(&self, record_id: &str) -> Result<ResourceRecord> {
        let zone_id = self.zone_id().await?;
        let url = self.endpoint(&["dnszones", zone_id, "resource_records", record_id])?;
        self.get(url, None).await
    }

    pub async fn delete_resource_record(&self, record_id: &str) -> Result<()> {
        let zone_id = self.zone_id().await?;
        let url = self.endpoint(&["dnszones", zone_id, "resource_records", record_id])?;
        self.delete(url).await
    }

    /// List the networks permitted to resolve the zone
    pub async fn list_permitted_networks(&self) -> Result<Vec<PermittedNetwork>> {
        let zone_id = self.zone_id().await?;
        self.list_all::<PermittedNetworkList>(&["dnszones", zone_id, "permitted_networks"])
            .await
    }

    pub async fn delete_permitted_network(&self, network_id: &str) -> Result<()> {
        let zone_id = self.zone_id().await?;
        let url = self.endpoint(&["dnszones", zone_id, "permitted_networks", network_id])?;
        self.delete(url).await
    }
}

/// Fail on non-2xx, keeping the status and the API's own message
pub(crate) async fn check(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(IbmError::ApiError {
            status: Some(status.as_u16()),
            message: error_message(&body),
        });
    }

    Ok(body)
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = check(response).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Best-effort message from an error body, which may not be JSON at all
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            errors, message, ..
        }) => errors
            .into_iter()
            .next()
            .map(|e| e.message)
            .or(message)
            .unwrap_or_else(|| "Unknown error".to_string()),
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

// ============ API Types ============

/// Pagination fields shared by every list response
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total_count: u32,
}

impl PageInfo {
    pub fn has_more(&self) -> bool {
        self.count > 0 && self.offset + self.count < self.total_count
    }
}

trait Page {
    type Item;
    fn info(&self) -> PageInfo;
    fn into_items(self) -> Vec<Self::Item>;
}

macro_rules! page {
    ($list:ident, $field:ident, $item:ty) => {
        #[derive(Debug, Deserialize)]
        struct $list {
            #[serde(default)]
            $field: Vec<$item>,
            #[serde(flatten)]
            info: PageInfo,
        }

        impl Page for $list {
            type Item = $item;

            fn info(&self) -> PageInfo {
                self.info
            }

            fn into_items(self) -> Vec<$item> {
                self.$field
            }
        }
    };
}

page!(ZoneList, dnszones, Zone);
page!(ResourceRecordList, resource_records, ResourceRecord);
page!(PermittedNetworkList, permitted_networks, PermittedNetwork);

#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub rdata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermittedNetwork {
    /// Equal to the id of the VPC it refers to
    pub id: String,
    #[serde(rename = "type", default)]
    pub network_type: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub permitted_network: NetworkRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkRef {
    pub vpc_crn: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorItem>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    message: String,
}
