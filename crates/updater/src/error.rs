use thiserror::Error;

use status_core::StatusError;
use status_messaging::MessagingError;
use status_persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum IngestorError {
    #[error(transparent)]
    Status(#[from] StatusError),

    #[error("messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("status updater is already running")]
    AlreadyRunning,

    #[error("status updater was stopped")]
    Stopped,
}
