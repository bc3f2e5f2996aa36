//! Concurrent teardown of independent resource families
//!
//! Each family (e.g. public DNS records, private DNS records and permitted
//! networks) gets its own sequential reconciliation loop. Families touch
//! disjoint kinds, so their loops run as separate tasks that share only the
//! run's context.

use crate::error::{CloudError, Result};
use crate::provider::KindRegistry;
use crate::reconciler::{ReconcileConfig, Reconciler, TeardownContext};
use crate::report::TeardownReport;
use crate::resource::ResourceKind;
use std::collections::{BTreeMap, BTreeSet};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// One teardown run over several resource families
pub struct Teardown {
    ctx: TeardownContext,
    families: Vec<Reconciler>,
    kinds: BTreeSet<ResourceKind>,
    duplicate: Option<ResourceKind>,
}

impl Teardown {
    pub fn new(ctx: TeardownContext) -> Self {
        Self {
            ctx,
            families: Vec::new(),
            kinds: BTreeSet::new(),
            duplicate: None,
        }
    }

    /// Add a family whose loop shares this run's context.
    ///
    /// A kind may belong to only one family; a kind already claimed by an
    /// earlier family makes [`Teardown::run`] fail before any call is made.
    pub fn family(
        mut self,
        name: impl Into<String>,
        config: ReconcileConfig,
        registry: KindRegistry,
    ) -> Self {
        if registry.is_empty() {
            return self;
        }
        for kind in registry.kinds() {
            if !self.kinds.insert(kind) {
                warn!(kind = %kind, "Resource kind already belongs to another family");
                self.duplicate.get_or_insert(kind);
            }
        }
        self.families
            .push(Reconciler::new(name, self.ctx.clone(), config, registry));
        self
    }

    pub fn context(&self) -> &TeardownContext {
        &self.ctx
    }

    pub fn family_names(&self) -> Vec<&str> {
        self.families.iter().map(|f| f.name()).collect()
    }

    /// Run every family to completion.
    ///
    /// Cancellation in any family wins over every other outcome. Otherwise
    /// leftovers from all timed-out families are merged into a single
    /// [`CloudError::Incomplete`].
    pub async fn run(self) -> Result<TeardownReport> {
        if let Some(kind) = self.duplicate {
            return Err(CloudError::DuplicateKind(kind));
        }

        let mut tasks = JoinSet::new();
        for family in self.families {
            tasks.spawn(async move {
                let name = family.name().to_string();
                (name, family.run().await)
            });
        }

        let mut report = TeardownReport::new();
        let mut cancelled = false;
        let mut pending: BTreeMap<ResourceKind, usize> = BTreeMap::new();
        let mut unseeded: BTreeSet<ResourceKind> = BTreeSet::new();
        let mut failure: Option<CloudError> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(family_report))) => {
                    info!(family = %name, deleted = family_report.deleted.len(), "Family torn down");
                    report.merge(family_report);
                }
                Ok((_, Err(CloudError::Cancelled))) => {
                    cancelled = true;
                }
                Ok((name, Err(CloudError::Incomplete { pending: p, unseeded: u }))) => {
                    warn!(family = %name, pending = ?p, "Family timed out with resources pending");
                    for (kind, count) in p {
                        *pending.entry(kind).or_default() += count;
                    }
                    unseeded.extend(u);
                }
                Ok((name, Err(e))) => {
                    warn!(family = %name, error = %e, "Family failed");
                    failure.get_or_insert(e);
                }
                Err(e) => {
                    failure.get_or_insert(CloudError::TaskFailed(e.to_string()));
                }
            }
        }

        if cancelled {
            return Err(CloudError::Cancelled);
        }
        if !pending.is_empty() || !unseeded.is_empty() {
            return Err(CloudError::Incomplete {
                pending,
                unseeded: unseeded.into_iter().collect(),
            });
        }
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(report)
    }
}
