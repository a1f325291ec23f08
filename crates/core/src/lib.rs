pub mod config;
pub mod error;
pub mod event;

pub use config::{
    IngestorConfig, MessagingConfig, PersistenceConfig, RetentionConfig, UpdaterConfig,
};
pub use error::*;
pub use event::{decode_timestamp, StatusEvent, StatusRecord, TIMESTAMP_FIELD};
