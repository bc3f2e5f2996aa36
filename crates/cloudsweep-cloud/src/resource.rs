//! Resource descriptors and resource sets
//!
//! A descriptor is the minimal identity record of one cloud object. A
//! [`ResourceSet`] is always rebuilt from a full enumeration and never edited
//! in place, so it can be shared with concurrent readers freely.

use serde::Serialize;
use std::collections::HashMap;

/// Tag selecting which enumerate/delete behavior applies (e.g. "cis dns record")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceKind(&'static str);

impl ResourceKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Identity and metadata of one cloud resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    /// Resource type
    pub kind: ResourceKind,

    /// Stable unique identifier within `kind`, used for dedup and tracking
    pub key: String,

    /// Display name, for logs only
    pub name: String,

    /// Identifier handed to the deleter
    pub provider_id: String,

    /// Free-form provider status
    pub status: Option<String>,
}

impl ResourceDescriptor {
    /// Create a descriptor whose provider id equals its key
    pub fn new(kind: ResourceKind, key: impl Into<String>, name: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            kind,
            provider_id: key.clone(),
            key,
            name: name.into(),
            status: None,
        }
    }

    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = provider_id.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Deduplicated collection of descriptors keyed by `key`
#[derive(Debug, Clone, Default)]
pub struct ResourceSet {
    resources: HashMap<String, ResourceDescriptor>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of this set and `descriptors`. A later descriptor with an
    /// existing key replaces the earlier one.
    pub fn insert(mut self, descriptors: impl IntoIterator<Item = ResourceDescriptor>) -> Self {
        for descriptor in descriptors {
            self.resources.insert(descriptor.key.clone(), descriptor);
        }
        self
    }

    /// All members, in unspecified order
    pub fn list(&self) -> Vec<ResourceDescriptor> {
        self.resources.values().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<ResourceDescriptor> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceDescriptor>>(iter: I) -> Self {
        ResourceSet::new().insert(iter)
    }
}
