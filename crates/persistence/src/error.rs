use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unknown persistence backend '{0}'")]
    UnknownBackend(String),

    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),

    #[error("filter on field '{0}' is not supported, only the record timestamp can be filtered")]
    UnsupportedFilter(String),

    #[error("config error: {0}")]
    Config(String),
}
