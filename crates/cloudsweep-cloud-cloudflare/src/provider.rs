//! Public DNS record teardown
//!
//! Lists every record in the zone, keeps the ones whose name or content ends
//! in the cluster domain, and deletes them one at a time.

use crate::dns::{CloudflareDns, DnsRecordInfo};
use crate::error::{CloudflareError, Result};
use async_trait::async_trait;
use cloudsweep_cloud::{
    ClusterPredicate, DeleteOutcome, Deleter, Enumerator, ResourceDescriptor, ResourceKind,
    ResourceSet,
};
use std::sync::Arc;

/// Kind label for records in a Cloudflare or CIS zone
pub const CIS_DNS_RECORD: ResourceKind = ResourceKind::new("cis dns record");

/// The record operations teardown needs from a zone
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_records(&self) -> Result<Vec<DnsRecordInfo>>;
    async fn get_record(&self, record_id: &str) -> Result<DnsRecordInfo>;
    async fn delete_record(&self, record_id: &str) -> Result<()>;
}

#[async_trait]
impl RecordStore for CloudflareDns {
    async fn list_records(&self) -> Result<Vec<DnsRecordInfo>> {
        CloudflareDns::list_records(self).await
    }

    async fn get_record(&self, record_id: &str) -> Result<DnsRecordInfo> {
        CloudflareDns::get_record(self, record_id).await
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        CloudflareDns::delete_record(self, record_id).await
    }
}

/// Enumerates and deletes the cluster's records in one zone
pub struct DnsRecordCleaner {
    store: Arc<dyn RecordStore>,
    predicate: Arc<dyn ClusterPredicate>,
}

impl DnsRecordCleaner {
    pub fn new(store: Arc<dyn RecordStore>, predicate: Arc<dyn ClusterPredicate>) -> Self {
        Self { store, predicate }
    }

    fn describe(record: &DnsRecordInfo) -> ResourceDescriptor {
        ResourceDescriptor::new(CIS_DNS_RECORD, record.id.as_str(), record.name.as_str())
            .with_status(record.record_type.as_str())
    }
}

/// Map a lookup/delete failure onto what the reconciler should do with it
fn classify(err: CloudflareError) -> cloudsweep_cloud::Result<DeleteOutcome> {
    match err.status() {
        Some(404) => Ok(DeleteOutcome::AlreadyGone),
        Some(status) if status >= 500 => Ok(DeleteOutcome::Transient(err.to_string())),
        _ => Err(err.into()),
    }
}

#[async_trait]
impl Enumerator for DnsRecordCleaner {
    async fn enumerate(&self) -> cloudsweep_cloud::Result<ResourceSet> {
        let records = self.store.list_records().await?;

        let matched: ResourceSet = records
            .iter()
            .filter(|r| {
                self.predicate
                    .matches_any(&[r.name.as_str(), r.content.as_str()])
            })
            .map(Self::describe)
            .collect();

        if matched.is_empty() && !records.is_empty() {
            let seen: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
            tracing::debug!(
                kind = %CIS_DNS_RECORD,
                seen = ?seen,
                "No records matched the cluster domain"
            );
        }

        Ok(matched)
    }
}

#[async_trait]
impl Deleter for DnsRecordCleaner {
    async fn delete(&self, item: &ResourceDescriptor) -> cloudsweep_cloud::Result<DeleteOutcome> {
        // Look the record up first so a record removed out of band is not
        // reported as a delete failure.
        if let Err(e) = self.store.get_record(&item.provider_id).await {
            return classify(e);
        }

        match self.store.delete_record(&item.provider_id).await {
            Ok(()) => Ok(DeleteOutcome::Requested),
            Err(e) => classify(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsweep_cloud::{CloudError, DomainSuffixMatcher};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeZone {
        records: Mutex<Vec<DnsRecordInfo>>,
        get_status: HashMap<&'static str, u16>,
        delete_status: HashMap<&'static str, u16>,
        deleted: Mutex<Vec<String>>,
    }

    impl FakeZone {
        fn with_records(records: &[(&str, &str, &str)]) -> Self {
            let records = records
                .iter()
                .map(|(id, name, content)| DnsRecordInfo {
                    id: id.to_string(),
                    name: name.to_string(),
                    record_type: "CNAME".to_string(),
                    content: content.to_string(),
                    ttl: Some(120),
                    proxied: false,
                })
                .collect();
            Self {
                records: Mutex::new(records),
                ..Default::default()
            }
        }
    }

    fn api_error(status: u16) -> CloudflareError {
        CloudflareError::ApiError {
            status: Some(status),
            message: format!("status {}", status),
        }
    }

    #[async_trait]
    impl RecordStore for FakeZone {
        async fn list_records(&self) -> Result<Vec<DnsRecordInfo>> {
            Ok(self.records.lock().unwrap().clone())
        }

        async fn get_record(&self, record_id: &str) -> Result<DnsRecordInfo> {
            if let Some(status) = self.get_status.get(record_id) {
                return Err(api_error(*status));
            }
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == record_id)
                .cloned()
                .ok_or_else(|| api_error(404))
        }

        async fn delete_record(&self, record_id: &str) -> Result<()> {
            if let Some(status) = self.delete_status.get(record_id) {
                return Err(api_error(*status));
            }
            self.records.lock().unwrap().retain(|r| r.id != record_id);
            self.deleted.lock().unwrap().push(record_id.to_string());
            Ok(())
        }
    }

    fn cleaner(zone: Arc<FakeZone>) -> DnsRecordCleaner {
        let matcher = DomainSuffixMatcher::new("mycluster", "example.com").unwrap();
        DnsRecordCleaner::new(zone, Arc::new(matcher))
    }

    fn item(id: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(CIS_DNS_RECORD, id, format!("{}.mycluster.example.com", id))
    }

    #[tokio::test]
    async fn test_enumerate_matches_name_or_content() {
        let zone = Arc::new(FakeZone::with_records(&[
            ("r1", "api.mycluster.example.com", "lb.example.net"),
            ("r2", "alias.example.com", "apps.mycluster.example.com"),
            ("r3", "www.example.com", "203.0.113.7"),
            ("r4", "api.othercluster.example.com", "lb.example.net"),
        ]));

        let set = cleaner(zone).enumerate().await.unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.contains("r1"));
        assert!(set.contains("r2"));
        let r1 = set.get("r1").unwrap();
        assert_eq!(r1.kind, CIS_DNS_RECORD);
        assert_eq!(r1.name, "api.mycluster.example.com");
        assert_eq!(r1.status.as_deref(), Some("CNAME"));
    }

    #[tokio::test]
    async fn test_enumerate_empty_zone() {
        let zone = Arc::new(FakeZone::default());
        assert!(cleaner(zone).enumerate().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_existing_record() {
        let zone = Arc::new(FakeZone::with_records(&[(
            "r1",
            "api.mycluster.example.com",
            "lb",
        )]));

        let outcome = cleaner(zone.clone()).delete(&item("r1")).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Requested);
        assert_eq!(*zone.deleted.lock().unwrap(), vec!["r1".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_already_gone() {
        let zone = Arc::new(FakeZone::default());
        let outcome = cleaner(zone.clone()).delete(&item("r9")).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::AlreadyGone);
        assert!(zone.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_server_error_is_transient() {
        let mut zone = FakeZone::with_records(&[("r1", "api.mycluster.example.com", "lb")]);
        zone.get_status.insert("r1", 500);

        let outcome = cleaner(Arc::new(zone)).delete(&item("r1")).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Transient(_)));
    }

    #[tokio::test]
    async fn test_delete_not_found_race_is_already_gone() {
        let mut zone = FakeZone::with_records(&[("r1", "api.mycluster.example.com", "lb")]);
        zone.delete_status.insert("r1", 404);

        let outcome = cleaner(Arc::new(zone)).delete(&item("r1")).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::AlreadyGone);
    }

    #[tokio::test]
    async fn test_delete_forbidden_is_an_error() {
        let mut zone = FakeZone::with_records(&[("r1", "api.mycluster.example.com", "lb")]);
        zone.delete_status.insert("r1", 403);

        let err = cleaner(Arc::new(zone)).delete(&item("r1")).await.unwrap_err();
        assert!(matches!(err, CloudError::ApiError(_)));
    }
}
