//! Retention window and the one-shot sweep.

use chrono::{DateTime, TimeDelta, Utc};
use status_persistence::{RecordFilter, RecordStore};
use tracing::info;

use crate::error::IngestorError;

/// Records older than this many days are eligible for deletion.
pub const DEFAULT_RETENTION_DAYS: u32 = 14;

/// `now - days`, clamped to the earliest representable instant.
pub fn retention_cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Delete every record with a timestamp strictly before `now - days`.
///
/// The cutoff is fixed before the delete is issued; records at or after it
/// are never removed by this call.
pub async fn cleanup_old_entries_at(
    store: &dyn RecordStore,
    now: DateTime<Utc>,
    days: u32,
) -> Result<u64, IngestorError> {
    let cutoff = retention_cutoff(now, days);
    let deleted = store.delete_many(&RecordFilter::older_than(cutoff)).await?;
    info!(
        collection = %store.collection(),
        deleted,
        %cutoff,
        retention_days = days,
        "removed expired status records"
    );
    Ok(deleted)
}

/// [`cleanup_old_entries_at`] with the current time.
pub async fn cleanup_old_entries(store: &dyn RecordStore, days: u32) -> Result<u64, IngestorError> {
    cleanup_old_entries_at(store, Utc::now(), days).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeZone;
    use serde_json::Map;
    use status_core::StatusRecord;
    use status_persistence::MemoryStore;

    fn record(ts: DateTime<Utc>) -> StatusRecord {
        StatusRecord {
            ts,
            fields: Map::new(),
        }
    }

    #[test]
    fn cutoff_is_days_before_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(
            retention_cutoff(now, 14),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn huge_window_clamps_instead_of_overflowing() {
        assert_eq!(retention_cutoff(Utc::now(), u32::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[tokio::test]
    async fn fifteen_days_deleted_thirteen_kept() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let store = MemoryStore::new("status");
        store.insert(record(now - TimeDelta::days(15))).await.unwrap();
        store.insert(record(now - TimeDelta::days(13))).await.unwrap();

        let deleted = cleanup_old_entries_at(&store, now, DEFAULT_RETENTION_DAYS)
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        let remaining = store.records();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].ts, now - TimeDelta::days(13));
    }

    #[tokio::test]
    async fn record_exactly_at_cutoff_is_kept() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let store = MemoryStore::new("status");
        let cutoff = retention_cutoff(now, 7);
        store.insert(record(cutoff)).await.unwrap();
        store.insert(record(cutoff - TimeDelta::seconds(1))).await.unwrap();
        store.insert(record(cutoff + TimeDelta::seconds(1))).await.unwrap();

        assert_eq!(cleanup_old_entries_at(&store, now, 7).await.unwrap(), 1);
        let kept: Vec<_> = store.records().into_iter().map(|r| r.ts).collect();
        assert_eq!(kept, vec![cutoff, cutoff + TimeDelta::seconds(1)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cleanup_during_inserts_keeps_new_records() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::new("status"));
        for days in 15..25 {
            store.insert(record(now - TimeDelta::days(days))).await.unwrap();
        }

        let writer = tokio::spawn({
            let store = store.clone();
            async move {
                for _ in 0..500 {
                    store.insert(record(now)).await.unwrap();
                    tokio::task::yield_now().await;
                }
            }
        });
        while store.len() <= 10 {
            tokio::task::yield_now().await;
        }

        let mut deleted = 0;
        for _ in 0..5 {
            deleted += cleanup_old_entries_at(store.as_ref(), now, 14).await.unwrap();
        }
        writer.await.unwrap();

        assert_eq!(deleted, 10);
        let remaining = store.records();
        assert_eq!(remaining.len(), 500);
        assert!(remaining.iter().all(|r| r.ts == now));
    }

    #[tokio::test]
    async fn cleanup_uses_wall_clock() {
        let store = MemoryStore::new("status");
        store.insert(record(Utc::now() - TimeDelta::days(20))).await.unwrap();
        store.insert(record(Utc::now())).await.unwrap();

        assert_eq!(cleanup_old_entries(&store, 14).await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }
}
