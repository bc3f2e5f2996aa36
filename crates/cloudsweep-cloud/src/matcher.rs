//! Cluster ownership predicates
//!
//! Enumerators decide which listed resources belong to the cluster being torn
//! down by asking a [`ClusterPredicate`]. The predicate runs once per
//! enumeration; nothing is cached between polls.

use crate::error::{CloudError, Result};
use regex::Regex;

/// Decides whether a name (or record content) belongs to the cluster
pub trait ClusterPredicate: Send + Sync {
    fn matches(&self, candidate: &str) -> bool;

    /// True if any of the candidates match
    fn matches_any(&self, candidates: &[&str]) -> bool {
        candidates.iter().any(|c| self.matches(c))
    }
}

/// Matches anything ending in `<cluster_name>.<base_domain>`
#[derive(Debug, Clone)]
pub struct DomainSuffixMatcher {
    pattern: Regex,
    suffix: String,
}

impl DomainSuffixMatcher {
    pub fn new(cluster_name: &str, base_domain: &str) -> Result<Self> {
        if cluster_name.is_empty() || base_domain.is_empty() {
            return Err(CloudError::InvalidInput(
                "cluster name and base domain must not be empty".to_string(),
            ));
        }

        let suffix = format!("{}.{}", cluster_name, base_domain);
        let pattern = Regex::new(&format!("{}$", regex::escape(&suffix)))
            .map_err(|e| CloudError::InvalidInput(format!("invalid domain pattern: {}", e)))?;

        Ok(Self { pattern, suffix })
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl ClusterPredicate for DomainSuffixMatcher {
    fn matches(&self, candidate: &str) -> bool {
        self.pattern.is_match(candidate)
    }
}

/// Matches names containing the infra ID pattern, or equal to an exact name
#[derive(Debug, Clone)]
pub struct NamePatternMatcher {
    pattern: Regex,
    exact: Option<String>,
}

impl NamePatternMatcher {
    /// `infra_id` is treated as a regular expression
    pub fn new(infra_id: &str, exact: Option<String>) -> Result<Self> {
        if infra_id.is_empty() {
            return Err(CloudError::InvalidInput("infra ID must not be empty".to_string()));
        }

        let pattern = Regex::new(infra_id)
            .map_err(|e| CloudError::InvalidInput(format!("invalid infra ID pattern: {}", e)))?;

        Ok(Self {
            pattern,
            exact: exact.filter(|name| !name.is_empty()),
        })
    }
}

impl ClusterPredicate for NamePatternMatcher {
    fn matches(&self, candidate: &str) -> bool {
        self.pattern.is_match(candidate) || self.exact.as_deref() == Some(candidate)
    }
}
