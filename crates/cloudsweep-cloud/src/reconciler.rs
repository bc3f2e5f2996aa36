//! Reconciliation loop
//!
//! Seeds the pending tracker from one enumeration per kind, then polls until
//! every tracked resource has vanished from a fresh listing, the deadline
//! passes, or the run is cancelled.
//!
//! A delete call's return value is never taken as proof of completion. A
//! resource is done only once it is absent from a re-enumeration (or the
//! provider reports it as not found), which tolerates listing APIs that lag
//! behind successful deletes.
//!
//! Every provider call is raced against both cancellation and the run's
//! deadline, so a hung call cannot hold the loop past its budget.

use crate::error::{CloudError, Result};
use crate::error_tracker::{ErrorTracker, LISTING_KEY};
use crate::pending::PendingTracker;
use crate::provider::{DeleteOutcome, KindHandler, KindRegistry};
use crate::report::{DeletionReason, TeardownReport};
use crate::resource::{ResourceDescriptor, ResourceKind};
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Timing configuration for one reconciliation loop
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Overall budget measured from the start of the run
    pub timeout: Duration,

    /// Delay between poll iterations
    pub poll_interval: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15 * 60),
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl ReconcileConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// State owned by one teardown run and shared by all of its loops
#[derive(Clone)]
pub struct TeardownContext {
    pub pending: PendingTracker,
    pub errors: ErrorTracker,
    pub cancel: CancellationToken,
}

impl TeardownContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            pending: PendingTracker::new(),
            errors: ErrorTracker::new(),
            cancel,
        }
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(CloudError::Cancelled);
        }
        Ok(())
    }

    /// Run an external call unless cancellation was already requested,
    /// abandoning it if cancellation arrives while it is in flight.
    pub async fn cancellable<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CloudError::Cancelled),
            result = call => result,
        }
    }

    /// Like [`TeardownContext::cancellable`], but also abandons the call once
    /// `deadline` passes, returning [`CloudError::DeadlineReached`].
    pub async fn bounded<T, F>(&self, deadline: Instant, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CloudError::Cancelled),
            _ = sleep_until(deadline) => Err(CloudError::DeadlineReached),
            result = call => result,
        }
    }
}

impl Default for TeardownContext {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

/// Reconciliation loop for one family of resource kinds
pub struct Reconciler {
    name: String,
    ctx: TeardownContext,
    config: ReconcileConfig,
    registry: KindRegistry,
}

impl Reconciler {
    pub fn new(
        name: impl Into<String>,
        ctx: TeardownContext,
        config: ReconcileConfig,
        registry: KindRegistry,
    ) -> Self {
        Self {
            name: name.into(),
            ctx,
            config,
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kinds(&self) -> Vec<ResourceKind> {
        self.registry.kinds()
    }

    /// Run until converged, timed out, or cancelled
    pub async fn run(&self) -> Result<TeardownReport> {
        self.run_until(Instant::now() + self.config.timeout).await
    }

    /// Run against an absolute deadline
    pub async fn run_until(&self, deadline: Instant) -> Result<TeardownReport> {
        if self.config.poll_interval.is_zero() {
            return Err(CloudError::InvalidInput(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        let mut unseeded: BTreeSet<ResourceKind> = self.registry.kinds().into_iter().collect();
        match self.drive(deadline, &mut unseeded).await {
            Err(CloudError::DeadlineReached) => {
                debug!(family = %self.name, "Deadline reached during a provider call");
                Err(self.incomplete(&unseeded))
            }
            outcome => outcome,
        }
    }

    /// Kinds stay in `unseeded` until their first successful enumeration.
    async fn drive(
        &self,
        deadline: Instant,
        unseeded: &mut BTreeSet<ResourceKind>,
    ) -> Result<TeardownReport> {
        let start = Instant::now();
        let mut report = TeardownReport::new();

        info!(family = %self.name, kinds = ?self.registry.kinds(), "Listing cluster resources");
        for handler in self.registry.iter() {
            self.seed(handler, deadline, unseeded).await?;
        }

        loop {
            self.ctx.check_cancelled()?;

            if self.converged(unseeded) {
                return Ok(self.finish(report, start));
            }

            if Instant::now() >= deadline {
                return Err(self.incomplete(unseeded));
            }

            report.polls += 1;
            debug!(family = %self.name, poll = report.polls, "Polling pending resources");
            for handler in self.registry.iter() {
                self.poll_kind(handler, deadline, unseeded, &mut report).await?;
            }

            if self.converged(unseeded) {
                return Ok(self.finish(report, start));
            }

            self.wait_for_next_poll(deadline).await?;
        }
    }

    fn finish(&self, mut report: TeardownReport, start: Instant) -> TeardownReport {
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            family = %self.name,
            deleted = report.deleted.len(),
            polls = report.polls,
            "All resources deleted"
        );
        report
    }

    async fn seed(
        &self,
        handler: &KindHandler,
        deadline: Instant,
        unseeded: &mut BTreeSet<ResourceKind>,
    ) -> Result<()> {
        let kind = handler.kind;
        match self.ctx.bounded(deadline, handler.enumerator.enumerate()).await {
            Ok(found) => {
                unseeded.remove(&kind);
                let items = self.ctx.pending.insert_pending(kind, found.list());
                debug!(kind = %kind, count = items.len(), "Tracking resources for deletion");
            }
            Err(e @ (CloudError::Cancelled | CloudError::DeadlineReached)) => return Err(e),
            Err(e) => {
                self.ctx.errors.suppress_warning(kind, LISTING_KEY, &e);
            }
        }
        Ok(())
    }

    async fn poll_kind(
        &self,
        handler: &KindHandler,
        deadline: Instant,
        unseeded: &mut BTreeSet<ResourceKind>,
        report: &mut TeardownReport,
    ) -> Result<()> {
        let kind = handler.kind;

        let found = match self.ctx.bounded(deadline, handler.enumerator.enumerate()).await {
            Ok(found) => found,
            Err(e @ (CloudError::Cancelled | CloudError::DeadlineReached)) => return Err(e),
            Err(e) => {
                // Only this kind's poll is lost; the next poll lists it again.
                self.ctx.errors.suppress_warning(kind, LISTING_KEY, &e);
                return Ok(());
            }
        };

        if unseeded.remove(&kind) {
            let items = self.ctx.pending.insert_pending(kind, found.list());
            debug!(kind = %kind, count = items.len(), "Tracking resources for deletion");
        }

        let mut items = self.ctx.pending.get_pending(kind);
        items.sort_by(|a, b| a.key.cmp(&b.key));

        for item in items {
            self.ctx.check_cancelled()?;

            if !found.contains(&item.key) {
                self.confirm_deleted(&item, DeletionReason::AbsentFromListing, report);
                continue;
            }

            match self.ctx.bounded(deadline, handler.deleter.delete(&item)).await {
                Ok(DeleteOutcome::Requested) => {
                    debug!(kind = %kind, key = %item.key, name = %item.name, "Delete requested");
                }
                Ok(DeleteOutcome::AlreadyGone) => {
                    self.confirm_deleted(&item, DeletionReason::ReportedGone, report);
                }
                Ok(DeleteOutcome::Transient(reason)) | Err(CloudError::Transient(reason)) => {
                    debug!(kind = %kind, key = %item.key, reason = %reason, "Transient failure, will retry");
                }
                Err(e @ (CloudError::Cancelled | CloudError::DeadlineReached)) => return Err(e),
                Err(e @ CloudError::InvalidInput(_)) => {
                    self.ctx.errors.suppress_warning(kind, &item.key, &e);
                    return Ok(());
                }
                Err(e) => {
                    self.ctx.errors.suppress_warning(kind, &item.key, &e);
                }
            }
        }

        Ok(())
    }

    fn confirm_deleted(
        &self,
        item: &ResourceDescriptor,
        reason: DeletionReason,
        report: &mut TeardownReport,
    ) {
        self.ctx.pending.remove_pending(item.kind, [item]);
        info!(kind = %item.kind, key = %item.key, "Deleted {} {:?}", item.kind, item.name);
        report.add_deleted(item, reason);
    }

    fn converged(&self, unseeded: &BTreeSet<ResourceKind>) -> bool {
        unseeded.is_empty()
            && self
                .registry
                .iter()
                .all(|handler| self.ctx.pending.is_kind_empty(handler.kind))
    }

    fn incomplete(&self, unseeded: &BTreeSet<ResourceKind>) -> CloudError {
        let kinds = self.registry.kinds();
        let pending = self
            .ctx
            .pending
            .counts()
            .into_iter()
            .filter(|(kind, _)| kinds.contains(kind))
            .collect();

        CloudError::Incomplete {
            pending,
            unseeded: unseeded.iter().copied().collect(),
        }
    }

    async fn wait_for_next_poll(&self, deadline: Instant) -> Result<()> {
        let wake = (Instant::now() + self.config.poll_interval).min(deadline);
        tokio::select! {
            biased;
            _ = self.ctx.cancel.cancelled() => Err(CloudError::Cancelled),
            _ = sleep_until(wake) => Ok(()),
        }
    }
}
