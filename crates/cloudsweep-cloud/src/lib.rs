//! cloudsweep cloud teardown core
//!
//! Discovers every cloud resource that belongs to a cluster, asks providers to
//! delete them, and re-polls until each one is confirmed gone or a deadline
//! expires.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 cloudsweep CLI                   │
//! │                (cloudsweep destroy)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                cloudsweep-cloud                  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   Teardown ─▶ Reconciler (per family)     │   │
//! │  │   trait Enumerator / trait Deleter        │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │   Pending    │  │    Error     │            │
//! │  │   Tracker    │  │   Tracker    │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  cloudflare   │ │  ibm dns svcs │
//! │  (cis) dns    │ │  + networks   │
//! └───────────────┘ └───────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cloudsweep_cloud::{KindRegistry, ReconcileConfig, Teardown, TeardownContext};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut records = KindRegistry::new();
//! records.register_provider(CIS_DNS_RECORD, Arc::new(cis))?;
//!
//! let report = Teardown::new(TeardownContext::new(CancellationToken::new()))
//!     .family("cis-dns", ReconcileConfig::default(), records)
//!     .run()
//!     .await?;
//! ```

pub mod error;
pub mod error_tracker;
pub mod matcher;
pub mod pending;
pub mod provider;
pub mod reconciler;
pub mod report;
pub mod resource;
pub mod teardown;

// Re-exports
pub use error::{CloudError, Result};
pub use error_tracker::{ErrorTracker, LISTING_KEY};
pub use matcher::{ClusterPredicate, DomainSuffixMatcher, NamePatternMatcher};
pub use pending::PendingTracker;
pub use provider::{DeleteOutcome, Deleter, Enumerator, KindHandler, KindRegistry};
pub use reconciler::{ReconcileConfig, Reconciler, TeardownContext};
pub use report::{DeletionReason, DeletionRecord, TeardownReport};
pub use resource::{ResourceDescriptor, ResourceKind, ResourceSet};
pub use teardown::Teardown;
