//! Collaborator traits and the per-kind registry
//!
//! Providers plug into the reconciler through two small traits. Each resource
//! kind is registered once with its enumerator and deleter, so the loop itself
//! never needs to know which kinds exist.

use crate::error::{CloudError, Result};
use crate::resource::{ResourceDescriptor, ResourceKind, ResourceSet};
use async_trait::async_trait;
use std::sync::Arc;

/// Lists the resources of one kind that currently belong to the cluster
#[async_trait]
pub trait Enumerator: Send + Sync {
    /// Return a complete, fresh snapshot. Pagination is handled internally.
    async fn enumerate(&self) -> Result<ResourceSet>;
}

/// Attempts to remove one resource and classifies the outcome
///
/// Returning `Err` marks a hard failure that is logged once and retried next
/// poll, except for [`CloudError::Cancelled`], which aborts the run, and
/// [`CloudError::InvalidInput`], which abandons the rest of this kind's poll.
#[async_trait]
pub trait Deleter: Send + Sync {
    async fn delete(&self, item: &ResourceDescriptor) -> Result<DeleteOutcome>;
}

/// Outcome of a single delete attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deletion was accepted; completion is confirmed by a later listing
    Requested,
    /// The provider reports the resource no longer exists
    AlreadyGone,
    /// Ignorable provider-side failure; retry next poll without surfacing it
    Transient(String),
}

/// Enumerator and deleter for one resource kind
#[derive(Clone)]
pub struct KindHandler {
    pub kind: ResourceKind,
    pub enumerator: Arc<dyn Enumerator>,
    pub deleter: Arc<dyn Deleter>,
}

/// Ordered map from kind to its handler, resolved once at setup
#[derive(Clone, Default)]
pub struct KindRegistry {
    handlers: Vec<KindHandler>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind. Kinds are seeded and polled in registration order.
    pub fn register(
        &mut self,
        kind: ResourceKind,
        enumerator: Arc<dyn Enumerator>,
        deleter: Arc<dyn Deleter>,
    ) -> Result<&mut Self> {
        if self.get(kind).is_some() {
            return Err(CloudError::DuplicateKind(kind));
        }
        self.handlers.push(KindHandler {
            kind,
            enumerator,
            deleter,
        });
        Ok(self)
    }

    /// Register a provider object that both lists and deletes the kind
    pub fn register_provider<P>(&mut self, kind: ResourceKind, provider: Arc<P>) -> Result<&mut Self>
    where
        P: Enumerator + Deleter + 'static,
    {
        self.register(kind, provider.clone(), provider)
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&KindHandler> {
        self.handlers.iter().find(|h| h.kind == kind)
    }

    pub fn kinds(&self) -> Vec<ResourceKind> {
        self.handlers.iter().map(|h| h.kind).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KindHandler> {
        self.handlers.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
