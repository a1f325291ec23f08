use std::sync::Arc;

use status_core::config::{PersistenceConfig, BACKEND_MEMORY, BACKEND_POSTGRES};
use tracing::info;

use crate::error::PersistenceError;
use crate::memory::MemoryStore;
use crate::postgres::PgStore;
use crate::store::RecordStore;

/// Resolve and open the persistence backend named in the config.
pub async fn open_store(config: &PersistenceConfig) -> Result<Arc<dyn RecordStore>, PersistenceError> {
    match config.backend.as_str() {
        BACKEND_POSTGRES => {
            let url = config.url.as_deref().ok_or_else(|| {
                PersistenceError::Config("persistence backend 'postgres' requires a url".into())
            })?;
            let store = PgStore::connect(url, &config.collection, config.max_connections).await?;
            info!(
                url = config.redacted_url().as_deref().unwrap_or_default(),
                collection = %config.collection,
                "postgres persistence backend ready"
            );
            Ok(Arc::new(store))
        }
        BACKEND_MEMORY => {
            info!(collection = %config.collection, "memory persistence backend ready");
            Ok(Arc::new(MemoryStore::new(&config.collection)))
        }
        other => Err(PersistenceError::UnknownBackend(other.to_string())),
    }
}
