use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("event has no '{0}' field")]
    MissingTimestamp(&'static str),

    #[error("invalid timestamp value {value}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}
