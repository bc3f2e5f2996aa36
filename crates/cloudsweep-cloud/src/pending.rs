//! Pending tracker
//!
//! Run-scoped registry of resources still awaiting confirmed deletion. The
//! tracker is the sole source of truth for "is the teardown finished": an
//! empty tracker means every observed resource has disappeared from a fresh
//! listing.

use crate::resource::{ResourceDescriptor, ResourceKind};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type KindMap = HashMap<String, ResourceDescriptor>;

/// Thread-safe per-kind map of resources awaiting deletion
///
/// Cloning yields another handle to the same tracker. Every operation takes
/// the lock once, so inserts and removals for a kind never interleave.
#[derive(Clone, Default)]
pub struct PendingTracker {
    inner: Arc<Mutex<HashMap<ResourceKind, KindMap>>>,
}

impl PendingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceKind, KindMap>> {
        // Each operation leaves the map consistent, so a panic elsewhere
        // cannot leave it half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add each descriptor under `(kind, key)` unless already present, then
    /// return everything pending for `kind`.
    ///
    /// Re-seeding a known key is a no-op that keeps the first descriptor.
    pub fn insert_pending(
        &self,
        kind: ResourceKind,
        descriptors: impl IntoIterator<Item = ResourceDescriptor>,
    ) -> Vec<ResourceDescriptor> {
        let mut pending = self.lock();
        let items = pending.entry(kind).or_default();
        for descriptor in descriptors {
            items.entry(descriptor.key.clone()).or_insert(descriptor);
        }
        items.values().cloned().collect()
    }

    /// Forget the given resources. Removing an absent key is a no-op.
    pub fn remove_pending<'a>(
        &self,
        kind: ResourceKind,
        descriptors: impl IntoIterator<Item = &'a ResourceDescriptor>,
    ) {
        let mut pending = self.lock();
        if let Some(items) = pending.get_mut(&kind) {
            for descriptor in descriptors {
                items.remove(&descriptor.key);
            }
        }
    }

    /// Snapshot of the resources pending for `kind`
    pub fn get_pending(&self, kind: ResourceKind) -> Vec<ResourceDescriptor> {
        self.lock()
            .get(&kind)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Leftover count per kind, omitting kinds with nothing pending
    pub fn counts(&self) -> BTreeMap<ResourceKind, usize> {
        self.lock()
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(kind, items)| (*kind, items.len()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().values().all(|items| items.is_empty())
    }

    pub fn is_kind_empty(&self, kind: ResourceKind) -> bool {
        self.lock().get(&kind).is_none_or(|items| items.is_empty())
    }
}
