//! Per-resource warning suppression
//!
//! The reconciliation loop retries failing resources on every poll. Logging
//! each failure would flood the output, so a warning is only emitted the first
//! time a given error text is seen for a resource. Errors are remembered per
//! resource, so two failures that alternate between polls are each reported
//! once. Keys are only unique within a kind, so history is scoped by both.

use crate::resource::ResourceKind;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Key under which a kind's enumeration failures are recorded
pub const LISTING_KEY: &str = "(listing)";

/// Error signature -> times it was suppressed
type Signatures = HashMap<String, usize>;

/// Run-scoped record of every error reported for each resource
#[derive(Clone, Default)]
pub struct ErrorTracker {
    history: Arc<Mutex<HashMap<(ResourceKind, String), Signatures>>>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `err` for `key` of `kind` at warn level unless the same error text
    /// was already reported for that resource. Repeats are logged at debug
    /// level.
    ///
    /// Returns `true` when a warning was emitted.
    pub fn suppress_warning(
        &self,
        kind: ResourceKind,
        key: &str,
        err: &dyn std::fmt::Display,
    ) -> bool {
        let signature = err.to_string();
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let seen = history.entry((kind, key.to_string())).or_default();

        match seen.get_mut(&signature) {
            Some(repeats) => {
                *repeats += 1;
                tracing::debug!(kind = %kind, key = %key, repeats = *repeats, error = %signature, "Suppressed repeated error");
                false
            }
            None => {
                tracing::warn!(kind = %kind, key = %key, error = %signature, "Resource deletion failing, will retry");
                seen.insert(signature, 0);
                true
            }
        }
    }

    /// How many reports for this resource were suppressed, across all of its
    /// distinct errors
    pub fn suppressed_count(&self, kind: ResourceKind, key: &str) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(kind, key.to_string()))
            .map(|seen| seen.values().sum())
            .unwrap_or(0)
    }

    /// Number of distinct errors reported for this resource
    pub fn distinct_errors(&self, kind: ResourceKind, key: &str) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(kind, key.to_string()))
            .map(|seen| seen.len())
            .unwrap_or(0)
    }

    /// Resources that have reported at least one error this run, sorted
    pub fn failing_keys(&self) -> Vec<(ResourceKind, String)> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<(ResourceKind, String)> = history.keys().cloned().collect();
        keys.sort();
        keys
    }
}
