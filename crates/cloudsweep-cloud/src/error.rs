//! Teardown error types

use crate::resource::ResourceKind;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors surfaced by the teardown core and its collaborators
#[derive(Error, Debug)]
pub enum CloudError {
    /// The run was cancelled. Takes priority over every other outcome.
    #[error("Teardown cancelled")]
    Cancelled,

    /// The deadline passed while resources were still pending deletion.
    #[error("{}", describe_incomplete(.pending, .unseeded))]
    Incomplete {
        /// Leftover item count per kind
        pending: BTreeMap<ResourceKind, usize>,
        /// Kinds that could never be enumerated during the run
        unseeded: Vec<ResourceKind>,
    },

    /// The deadline passed while an external call was still in flight.
    /// The loop reports this as [`CloudError::Incomplete`].
    #[error("Deadline reached during a provider call")]
    DeadlineReached,

    /// An identifier or parameter could not be parsed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("API error: {0}")]
    ApiError(String),

    /// Provider-side failure expected to clear on retry
    #[error("Transient provider error: {0}")]
    Transient(String),

    #[error("Resource kind registered twice: {0}")]
    DuplicateKind(ResourceKind),

    #[error("Teardown task failed: {0}")]
    TaskFailed(String),
}

impl CloudError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CloudError::Cancelled)
    }

    /// Number of leftover items if this is a timeout-with-leftovers error
    pub fn pending_count(&self) -> Option<usize> {
        match self {
            CloudError::Incomplete { pending, .. } => Some(pending.values().sum()),
            _ => None,
        }
    }
}

fn describe_incomplete(
    pending: &BTreeMap<ResourceKind, usize>,
    unseeded: &[ResourceKind],
) -> String {
    let total: usize = pending.values().sum();
    let mut message = format!("Teardown incomplete: {} undeleted items pending", total);

    if !pending.is_empty() {
        let per_kind: Vec<String> = pending
            .iter()
            .map(|(kind, count)| format!("{}={}", kind, count))
            .collect();
        message.push_str(&format!(" ({})", per_kind.join(", ")));
    }

    if !unseeded.is_empty() {
        let kinds: Vec<String> = unseeded.iter().map(|k| k.to_string()).collect();
        message.push_str(&format!("; never listed: {}", kinds.join(", ")));
    }

    message
}

pub type Result<T> = std::result::Result<T, CloudError>;
