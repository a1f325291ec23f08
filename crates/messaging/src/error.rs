use thiserror::Error;

/// Errors that can occur in the messaging layer.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("zeromq error: {0}")]
    Zmq(#[from] zeromq::ZmqError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid endpoint '{0}', expected ipc://<path> or tcp://<host>:<port>")]
    InvalidEndpoint(String),

    #[error("unknown messaging backend '{0}'")]
    UnknownBackend(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("already subscribed to '{0}' on this socket")]
    AlreadySubscribed(String),

    #[error("message source closed")]
    Closed,

    #[error("handler error: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MessagingError {
    /// Wrap a failure raised by a message handler.
    pub fn handler(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Handler(Box::new(err))
    }
}
