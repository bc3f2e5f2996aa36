//! Cloudflare provider error types

use cloudsweep_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudflareError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("DNS zone not found: {0}")]
    ZoneNotFound(String),

    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    ApiError { status: Option<u16>, message: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CloudflareError {
    /// HTTP status returned by the API, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            CloudflareError::ApiError { status, .. } => *status,
            CloudflareError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<CloudflareError> for CloudError {
    fn from(e: CloudflareError) -> Self {
        match e {
            CloudflareError::MissingEnvVar(_) | CloudflareError::InvalidConfig(_) => {
                CloudError::InvalidInput(e.to_string())
            }
            CloudflareError::HttpError(ref inner) if inner.is_timeout() => {
                CloudError::Transient(e.to_string())
            }
            _ if e.status().is_some_and(|s| s >= 500) => CloudError::Transient(e.to_string()),
            _ => CloudError::ApiError(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudflareError>;
