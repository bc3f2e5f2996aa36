//! Teardown report types

use crate::resource::{ResourceDescriptor, ResourceKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Why a resource was considered deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionReason {
    /// The resource no longer appears in a fresh listing
    AbsentFromListing,
    /// The provider reported the resource as not found
    ReportedGone,
}

impl std::fmt::Display for DeletionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeletionReason::AbsentFromListing => write!(f, "absent from listing"),
            DeletionReason::ReportedGone => write!(f, "reported gone"),
        }
    }
}

/// One confirmed deletion
#[derive(Debug, Clone, Serialize)]
pub struct DeletionRecord {
    pub kind: ResourceKind,
    pub key: String,
    pub name: String,
    pub reason: DeletionReason,
    pub confirmed_at: DateTime<Utc>,
}

/// Result of a teardown run
#[derive(Debug, Clone, Serialize)]
pub struct TeardownReport {
    /// Confirmed deletions, in confirmation order
    pub deleted: Vec<DeletionRecord>,

    /// Number of poll iterations performed
    pub polls: u32,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl TeardownReport {
    pub fn new() -> Self {
        Self {
            deleted: Vec::new(),
            polls: 0,
            duration_ms: 0,
        }
    }

    pub fn add_deleted(&mut self, item: &ResourceDescriptor, reason: DeletionReason) {
        self.deleted.push(DeletionRecord {
            kind: item.kind,
            key: item.key.clone(),
            name: item.name.clone(),
            reason,
            confirmed_at: Utc::now(),
        });
    }

    /// Fold another family's report into this one
    pub fn merge(&mut self, other: TeardownReport) {
        self.deleted.extend(other.deleted);
        self.polls = self.polls.max(other.polls);
        self.duration_ms = self.duration_ms.max(other.duration_ms);
    }

    /// Deletions per kind
    pub fn summary(&self) -> BTreeMap<ResourceKind, usize> {
        self.deleted.iter().fold(BTreeMap::new(), |mut acc, record| {
            *acc.entry(record.kind).or_default() += 1;
            acc
        })
    }
}

impl Default for TeardownReport {
    fn default() -> Self {
        Self::new()
    }
}
