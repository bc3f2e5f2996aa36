//! Cloudflare-compatible DNS API client
//!
//! Talks to the Cloudflare v4 zone API directly. IBM Cloud Internet Services
//! exposes the same API under a base URL scoped by the instance CRN and
//! authenticates with an `X-Auth-User-Token` header instead of a bearer token.

use crate::error::{CloudflareError, Result};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Upper bound on any single API request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const CIS_API_BASE: &str = "https://api.cis.cloud.ibm.com/v1";

/// Page size used when listing DNS records
pub const RECORDS_PER_PAGE: u32 = 20;

/// How requests are authenticated
#[derive(Clone)]
pub enum ApiAuth {
    /// `Authorization: Bearer <token>` (Cloudflare API tokens)
    Bearer(String),
    /// `X-Auth-User-Token: <value>` (IBM Cloud Internet Services)
    UserToken(String),
}

impl std::fmt::Debug for ApiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuth::Bearer(_) => write!(f, "Bearer(***)"),
            ApiAuth::UserToken(_) => write!(f, "UserToken(***)"),
        }
    }
}

/// Configuration for the DNS client
#[derive(Debug, Clone)]
pub struct DnsConfig {
    /// API root, e.g. `https://api.cloudflare.com/client/v4`
    pub api_base: String,
    /// Path segments between the API root and `zones` (the CRN for CIS)
    pub scope: Vec<String>,
    pub auth: ApiAuth,
    /// Zone to operate on; resolved from `domain` when absent
    pub zone_id: Option<String>,
    /// Zone apex, e.g. `example.com`
    pub domain: String,
}

impl DnsConfig {
    /// Cloudflare account with a scoped API token
    pub fn cloudflare(
        api_token: impl Into<String>,
        zone_id: Option<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            api_base: CLOUDFLARE_API_BASE.to_string(),
            scope: Vec::new(),
            auth: ApiAuth::Bearer(api_token.into()),
            zone_id,
            domain: domain.into(),
        }
    }

    /// IBM Cloud Internet Services instance, authenticated with an IAM token
    pub fn cis(instance_crn: impl Into<String>, iam_token: &str, domain: impl Into<String>) -> Self {
        let token = if iam_token.starts_with("Bearer ") {
            iam_token.to_string()
        } else {
            format!("Bearer {}", iam_token)
        };

        Self {
            api_base: CIS_API_BASE.to_string(),
            scope: vec![instance_crn.into()],
            auth: ApiAuth::UserToken(token),
            zone_id: None,
            domain: domain.into(),
        }
    }

    /// Create DnsConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("CLOUDFLARE_API_TOKEN")
            .map_err(|_| CloudflareError::MissingEnvVar("CLOUDFLARE_API_TOKEN".to_string()))?;
        let domain = std::env::var("CLOUDFLARE_DOMAIN")
            .map_err(|_| CloudflareError::MissingEnvVar("CLOUDFLARE_DOMAIN".to_string()))?;
        let zone_id = std::env::var("CLOUDFLARE_ZONE_ID").ok();

        Ok(Self::cloudflare(api_token, zone_id, domain))
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

/// Cloudflare-compatible DNS client
pub struct CloudflareDns {
    client: reqwest::Client,
    api_base: Url,
    scope: Vec<String>,
    auth: ApiAuth,
    domain: String,
    zone_id: OnceCell<String>,
}

impl CloudflareDns {
    /// Create a new DNS client
    pub fn new(config: DnsConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            CloudflareError::InvalidConfig(format!("invalid API base {}: {}", config.api_base, e))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(CloudflareError::InvalidConfig(format!(
                "API base cannot carry a path: {}",
                config.api_base
            )));
        }

        let zone_id = match config.zone_id {
            Some(id) => OnceCell::new_with(Some(id)),
            None => OnceCell::new(),
        };

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_base,
            scope: config.scope,
            auth: config.auth,
            domain: config.domain,
            zone_id,
        })
    }

    /// Get the domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Build an endpoint URL from path segments below the scope.
    /// Each segment is percent-encoded, so CRNs containing `/` stay intact.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| CloudflareError::InvalidConfig("API base cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(self.scope.iter().map(String::as_str))
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            ApiAuth::Bearer(token) => request.bearer_auth(token),
            ApiAuth::UserToken(value) => request.header("X-Auth-User-Token", value),
        }
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
        let url = self.endpoint(&["zones"])?;
        let response = self
            .authorize(self.client.get(url))
            .query(&[("name", self.domain.as_str())])
            .send()
            .await?;

        let api_response: ApiResponse<Vec<ApiZone>> = decode(response).await?;
        api_response
            .result
            .into_iter()
            .find(|zone| zone.name == self.domain)
            .map(|zone| {
                tracing::debug!("Resolved DNS zone {} -> {}", zone.name, zone.id);
                zone.id
            })
            .ok_or_else(|| CloudflareError::ZoneNotFound(self.domain.clone()))
    }

    /// List one page of DNS records in the zone
    pub async fn list_records_page(&self, page: u32) -> Result<RecordPage> {
        let zone_id = self.zone_id().await?;
        let url = self.endpoint(&["zones", zone_id, "dns_records"])?;

        let response = self
            .authorize(self.client.get(url))
            .query(&[("page", page), ("per_page", RECORDS_PER_PAGE)])
            .send()
            .await?;

        let api_response: ApiResponse<Vec<ApiDnsRecord>> = decode(response).await?;
        let info = api_response.result_info.unwrap_or(ResultInfo {
            page,
            per_page: RECORDS_PER_PAGE,
            count: api_response.result.len() as u32,
            total_count: None,
        });

        tracing::debug!(
            "listRecords: PerPage = {}, Page = {}, Count = {}",
            info.per_page,
            info.page,
            info.count
        );

        Ok(RecordPage {
            records: api_response.result.into_iter().map(DnsRecordInfo::from).collect(),
            info,
        })
    }

    /// List all DNS records in the zone
    pub async fn list_records(&self) -> Result<Vec<DnsRecordInfo>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.list_records_page(page).await?;
            let more = batch.info.has_more();
            records.extend(batch.records);
            if !more {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    /// Get a DNS record by id
    pub async fn get_record(&self, record_id: &str) -> Result<DnsRecordInfo> {
        let zone_id = self.zone_id().await?;
        let url = self.endpoint(&["zones", zone_id, "dns_records", record_id])?;

        let response = self.authorize(self.client.get(url)).send().await?;
        let api_response: ApiResponse<ApiDnsRecord> = decode(response).await?;
        Ok(api_response.result.into())
    }

    /// Delete a DNS record
    pub async fn delete_record(&self, record_id: &str) -> Result<()> {
        let zone_id = self.zone_id().await?;
        let url = self.endpoint(&["zones", zone_id, "dns_records", record_id])?;

        let response = self.authorize(self.client.delete(url)).send().await?;
        let _: ApiResponse<DeleteResult> = decode(response).await?;
        Ok(())
    }
}

/// Turn an HTTP response into the API envelope, surfacing failures with
/// their status code
async fn decode<T: DeserializeOwned>(response: Response) -> Result<ApiResponse<T>> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(CloudflareError::ApiError {
            status: Some(status.as_u16()),
            message: error_message(&body),
        });
    }

    let api_response: ApiResponse<T> = serde_json::from_str(&body)?;
    if !api_response.success {
        return Err(CloudflareError::ApiError {
            status: Some(status.as_u16()),
            message: first_error(&api_response.errors),
        });
    }

    Ok(api_response)
}

fn first_error(errors: &[ApiError]) -> String {
    errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// Best-effort message from an error body, which may not be JSON at all
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.errors.is_empty() => first_error(&envelope.errors),
        _ if body.trim().is_empty() => "Unknown error".to_string(),
        _ => body.trim().to_string(),
    }
}

/// DNS record information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsRecordInfo {
    pub id: String,
    pub name: String,
    pub record_type: String,
    pub content: String,
    pub ttl: Option<u32>,
    pub proxied: bool,
}

impl From<ApiDnsRecord> for DnsRecordInfo {
    fn from(r: ApiDnsRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            record_type: r.r#type,
            content: r.content,
            ttl: r.ttl,
            proxied: r.proxied,
        }
    }
}

/// One page of a record listing
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<DnsRecordInfo>,
    pub info: ResultInfo,
}

/// Pagination block of a listing response
#[derive(Debug, Clone, Deserialize)]
pub struct ResultInfo {
    pub page: u32,
    pub per_page: u32,
    pub count: u32,
    #[serde(default)]
    pub total_count: Option<u32>,
}

impl ResultInfo {
    /// A full page means another page may follow
    pub fn has_more(&self) -> bool {
        self.count > 0 && self.per_page == self.count
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    result: T,
    #[serde(default)]
    result_info: Option<ResultInfo>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[allow(dead_code)]
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiZone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiDnsRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    r#type: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    ttl: Option<u32>,
    #[serde(default)]
    proxied: bool,
}

#[derive(Debug, Deserialize)]
struct DeleteResult {
    #[allow(dead_code)]
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloudflare_config() -> DnsConfig {
        DnsConfig::cloudflare("test", Some("zone-1".to_string()), "example.com")
    }

    #[test]
    fn test_endpoint_for_cloudflare() {
        let dns = CloudflareDns::new(cloudflare_config()).unwrap();
        let url = dns.endpoint(&["zones", "zone-1", "dns_records"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.cloudflare.com/client/v4/zones/zone-1/dns_records"
        );
    }

    #[test]
    fn test_endpoint_for_cis_encodes_crn() {
        let crn = "crn:v1:bluemix:public:internet-svcs:global:a/abc123:inst-1::";
        let dns = CloudflareDns::new(DnsConfig::cis(crn, "token", "example.com")).unwrap();
        let url = dns.endpoint(&["zones"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.cis.cloud.ibm.com/v1/crn:v1:bluemix:public:internet-svcs:global:a%2Fabc123:inst-1::/zones"
        );
    }

    #[test]
    fn test_cis_token_gets_bearer_prefix_once() {
        let config = DnsConfig::cis("crn", "abc", "example.com");
        assert!(matches!(config.auth, ApiAuth::UserToken(ref v) if v == "Bearer abc"));

        let config = DnsConfig::cis("crn", "Bearer abc", "example.com");
        assert!(matches!(config.auth, ApiAuth::UserToken(ref v) if v == "Bearer abc"));
        assert_eq!(format!("{:?}", config.auth), "UserToken(***)");
    }

    #[test]
    fn test_invalid_api_base_rejected() {
        let config = cloudflare_config().with_api_base("not a url");
        assert!(matches!(
            CloudflareDns::new(config),
            Err(CloudflareError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_configured_zone_id_skips_lookup() {
        let dns = CloudflareDns::new(cloudflare_config()).unwrap();
        assert_eq!(dns.zone_id().await.unwrap(), "zone-1");
        assert_eq!(dns.domain(), "example.com");
    }

    #[test]
    fn test_has_more_pages() {
        let full = ResultInfo {
            page: 1,
            per_page: 20,
            count: 20,
            total_count: Some(41),
        };
        let partial = ResultInfo {
            page: 3,
            per_page: 20,
            count: 1,
            total_count: Some(41),
        };
        let empty = ResultInfo {
            page: 1,
            per_page: 0,
            count: 0,
            total_count: None,
        };

        assert!(full.has_more());
        assert!(!partial.has_more());
        assert!(!empty.has_more());
    }

    #[test]
    fn test_decode_record_listing() {
        let body = r#"{
            "success": true,
            "errors": [],
            "messages": [],
            "result": [
                {"id": "r1", "name": "api.mycluster.example.com", "type": "CNAME",
                 "content": "lb.example.net", "ttl": 120, "proxied": false},
                {"id": "r2", "name": "www.example.com", "type": "A", "content": "203.0.113.7"}
            ],
            "result_info": {"page": 1, "per_page": 20, "count": 2, "total_count": 2}
        }"#;

        let response: ApiResponse<Vec<ApiDnsRecord>> = serde_json::from_str(body).unwrap();
        assert!(response.success);
        let info = response.result_info.unwrap();
        assert!(!info.has_more());

        let records: Vec<DnsRecordInfo> = response.result.into_iter().map(Into::into).collect();
        assert_eq!(records[0].record_type, "CNAME");
        assert_eq!(records[0].ttl, Some(120));
        assert_eq!(records[1].ttl, None);
        assert!(!records[1].proxied);
    }

    #[test]
    fn test_error_message_extraction() {
        let json = r#"{"success": false, "errors": [{"code": 81044, "message": "Record does not exist."}]}"#;
        assert_eq!(error_message(json), "Record does not exist.");
        assert_eq!(error_message("upstream timeout\n"), "upstream timeout");
        assert_eq!(error_message(""), "Unknown error");
    }
}
