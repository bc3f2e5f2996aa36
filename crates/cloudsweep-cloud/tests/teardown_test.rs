mod common;

use cloudsweep_cloud::{
    CloudError, KindRegistry, ReconcileConfig, ResourceKind, Teardown, TeardownContext,
};
use common::{Listing, Outcome, ScriptedDeleter, ScriptedEnumerator};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const PUBLIC_RECORD: ResourceKind = ResourceKind::new("cis dns record");
const PRIVATE_RECORD: ResourceKind = ResourceKind::new("ibm dns record");
const NETWORK: ResourceKind = ResourceKind::new("permitted network");

fn config() -> ReconcileConfig {
    ReconcileConfig::default()
        .with_timeout(Duration::from_secs(30))
        .with_poll_interval(Duration::from_secs(5))
}

fn family(kind: ResourceKind, script: Vec<Listing>, deleter: Vec<(&'static str, Vec<Outcome>)>) -> KindRegistry {
    let mut registry = KindRegistry::new();
    registry
        .register(kind, ScriptedEnumerator::new(kind, script), ScriptedDeleter::new(deleter))
        .unwrap();
    registry
}

#[tokio::test(start_paused = true)]
async fn test_families_merge_reports() {
    let teardown = Teardown::new(TeardownContext::default())
        .family(
            "cis-dns",
            config(),
            family(
                PUBLIC_RECORD,
                vec![Listing::Keys(vec!["api", "apps"]), Listing::Keys(vec![])],
                vec![],
            ),
        )
        .family(
            "dns-services",
            config(),
            family(
                PRIVATE_RECORD,
                vec![Listing::Keys(vec!["api-int"]), Listing::Keys(vec!["api-int"])],
                vec![("api-int", vec![Outcome::Gone])],
            ),
        );

    assert_eq!(teardown.family_names(), vec!["cis-dns", "dns-services"]);
    let ctx = teardown.context().clone();

    let report = teardown.run().await.unwrap();

    let summary = report.summary();
    assert_eq!(summary.get(&PUBLIC_RECORD), Some(&2));
    assert_eq!(summary.get(&PRIVATE_RECORD), Some(&1));
    assert!(ctx.pending.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_incomplete_family_reports_only_its_leftovers() {
    let result = Teardown::new(TeardownContext::default())
        .family(
            "cis-dns",
            config(),
            family(
                PUBLIC_RECORD,
                vec![Listing::Keys(vec!["api"]), Listing::Keys(vec![])],
                vec![],
            ),
        )
        .family(
            "networks",
            config(),
            family(
                NETWORK,
                vec![Listing::Keys(vec!["vpc-1", "vpc-2"])],
                vec![("vpc-1", vec![Outcome::Fail("network in use")])],
            ),
        )
        .run()
        .await;

    match result {
        Err(CloudError::Incomplete { pending, unseeded }) => {
            assert_eq!(pending.len(), 1);
            assert_eq!(pending.get(&NETWORK), Some(&2));
            assert!(unseeded.is_empty());
        }
        other => panic!("expected Incomplete, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_wins_over_incomplete() {
    let cancel = CancellationToken::new();
    let ctx = TeardownContext::new(cancel.clone());

    let mut cancelling = KindRegistry::new();
    cancelling
        .register(
            NETWORK,
            ScriptedEnumerator::new(NETWORK, vec![Listing::Keys(vec!["vpc-1"])]),
            ScriptedDeleter::with_cancel(vec![("vpc-1", vec![Outcome::CancelRun])], Some(cancel)),
        )
        .unwrap();

    let result = Teardown::new(ctx)
        .family(
            "cis-dns",
            ReconcileConfig::default()
                .with_timeout(Duration::from_secs(1))
                .with_poll_interval(Duration::from_secs(5)),
            family(
                PUBLIC_RECORD,
                vec![Listing::Keys(vec!["api"])],
                vec![("api", vec![Outcome::Fail("locked")])],
            ),
        )
        .family("networks", config(), cancelling)
        .run()
        .await;

    assert!(matches!(result, Err(CloudError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn test_empty_registry_is_skipped() {
    let teardown = Teardown::new(TeardownContext::default()).family(
        "nothing",
        config(),
        KindRegistry::new(),
    );

    assert!(teardown.family_names().is_empty());
    let report = teardown.run().await.unwrap();
    assert!(report.deleted.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_kind_shared_by_two_families_is_rejected() {
    let first = ScriptedEnumerator::new(PUBLIC_RECORD, vec![Listing::Keys(vec!["api"])]);
    let second = ScriptedEnumerator::new(PUBLIC_RECORD, vec![Listing::Keys(vec!["api"])]);

    let mut public = KindRegistry::new();
    public
        .register(PUBLIC_RECORD, first.clone(), ScriptedDeleter::new(vec![]))
        .unwrap();
    let mut mixed = family(NETWORK, vec![Listing::Keys(vec![])], vec![]);
    mixed
        .register(PUBLIC_RECORD, second.clone(), ScriptedDeleter::new(vec![]))
        .unwrap();

    let result = Teardown::new(TeardownContext::default())
        .family("cis-dns", config(), public)
        .family("networks", config(), mixed)
        .run()
        .await;

    match result {
        Err(CloudError::DuplicateKind(kind)) => assert_eq!(kind, PUBLIC_RECORD),
        other => panic!("expected DuplicateKind, got {:?}", other.map(|r| r.deleted.len())),
    }
    assert_eq!(first.calls(), 0);
    assert_eq!(second.calls(), 0);
}
