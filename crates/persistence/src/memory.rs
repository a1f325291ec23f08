use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use status_core::StatusRecord;
use tracing::debug;

use crate::error::PersistenceError;
use crate::filter::RecordFilter;
use crate::store::RecordStore;

/// Records held in process memory, in insertion order.
///
/// `delete_many` holds the write lock for the whole sweep, so inserts that
/// arrive meanwhile land after it and are never touched by it.
pub struct MemoryStore {
    collection: String,
    records: RwLock<Vec<StatusRecord>>,
}

impl MemoryStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of the stored records.
    pub fn records(&self) -> Vec<StatusRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, record: StatusRecord) -> Result<(), PersistenceError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.push(record);
        debug!(collection = %self.collection, total = records.len(), "inserted record");
        Ok(())
    }

    async fn delete_many(&self, filter: &RecordFilter) -> Result<u64, PersistenceError> {
        filter.ensure_timestamp_field()?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|r| !filter.matches(&r.ts));
        Ok((before - records.len()) as u64)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Comparison;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Map};

    fn record(secs: i64, host: &str) -> StatusRecord {
        let mut fields = Map::new();
        fields.insert("host".into(), json!(host));
        StatusRecord {
            ts: Utc.timestamp_opt(secs, 0).unwrap(),
            fields,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn insert_keeps_order() {
        let store = MemoryStore::new("status");
        store.insert(record(2, "b")).await.unwrap();
        store.insert(record(1, "a")).await.unwrap();

        let hosts: Vec<_> = store.records().iter().map(|r| r.fields["host"].clone()).collect();
        assert_eq!(hosts, vec![json!("b"), json!("a")]);
        assert_eq!(store.collection(), "status");
    }

    #[tokio::test]
    async fn delete_many_removes_only_matching() {
        let store = MemoryStore::new("status");
        for (secs, host) in [(10, "old"), (20, "edge"), (30, "new")] {
            store.insert(record(secs, host)).await.unwrap();
        }

        let deleted = store.delete_many(&RecordFilter::older_than(at(20))).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining: Vec<_> = store.records().iter().map(|r| r.ts.timestamp()).collect();
        assert_eq!(remaining, vec![20, 30]);
    }

    #[tokio::test]
    async fn delete_many_with_gte() {
        let store = MemoryStore::new("status");
        for secs in [10, 20, 30] {
            store.insert(record(secs, "h")).await.unwrap();
        }
        let filter = RecordFilter::timestamp(Comparison::Gte, at(20));
        assert_eq!(store.delete_many(&filter).await.unwrap(), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_on_empty_store() {
        let store = MemoryStore::new("status");
        assert_eq!(store.delete_many(&RecordFilter::older_than(at(0))).await.unwrap(), 0);
        assert!(store.is_empty());
    }
}
