use std::sync::Arc;

use async_trait::async_trait;
use status_core::StatusRecord;

use crate::error::PersistenceError;
use crate::filter::RecordFilter;

/// Append-only record collection with bulk deletion.
///
/// Implementations handle their own internal synchronization; callers may
/// insert and delete concurrently from any task.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist one record.
    async fn insert(&self, record: StatusRecord) -> Result<(), PersistenceError>;

    /// Delete every record matching `filter`, returning how many were removed.
    async fn delete_many(&self, filter: &RecordFilter) -> Result<u64, PersistenceError>;

    /// Backend name for logs.
    fn backend(&self) -> &'static str;

    /// Collection the store is bound to.
    fn collection(&self) -> &str;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn insert(&self, record: StatusRecord) -> Result<(), PersistenceError> {
        (**self).insert(record).await
    }

    async fn delete_many(&self, filter: &RecordFilter) -> Result<u64, PersistenceError> {
        (**self).delete_many(filter).await
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    fn collection(&self) -> &str {
        (**self).collection()
    }
}
