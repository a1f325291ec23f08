use crate::error::StatusError;

use super::types::{UpdaterConfig, BACKEND_MEMORY, BACKEND_POSTGRES, BACKEND_ZMQ};

impl UpdaterConfig {
    /// Validate the config: known backends, required endpoints, sane intervals.
    pub fn validate(&self) -> Result<(), StatusError> {
        self.validate_messaging()?;
        self.validate_persistence()?;
        self.validate_intervals()?;
        Ok(())
    }

    fn validate_messaging(&self) -> Result<(), StatusError> {
        match self.messaging.backend.as_str() {
            BACKEND_MEMORY => {}
            BACKEND_ZMQ => {
                if self.messaging.endpoint.as_deref().map_or(true, str::is_empty) {
                    return Err(StatusError::Config(
                        "messaging backend 'zmq' requires an endpoint".into(),
                    ));
                }
            }
            other => {
                return Err(StatusError::Config(format!(
                    "invalid messaging backend '{other}', expected 'zmq' or 'memory'"
                )));
            }
        }
        if self.messaging.queue.is_empty() {
            return Err(StatusError::Config("messaging queue name is empty".into()));
        }
        Ok(())
    }

    fn validate_persistence(&self) -> Result<(), StatusError> {
        match self.persistence.backend.as_str() {
            BACKEND_MEMORY => {}
            BACKEND_POSTGRES => {
                if self.persistence.url.as_deref().map_or(true, str::is_empty) {
                    return Err(StatusError::Config(
                        "persistence backend 'postgres' requires a url".into(),
                    ));
                }
                if self.persistence.max_connections == 0 {
                    return Err(StatusError::Config(
                        "persistence max_connections must be at least 1".into(),
                    ));
                }
            }
            other => {
                return Err(StatusError::Config(format!(
                    "invalid persistence backend '{other}', expected 'postgres' or 'memory'"
                )));
            }
        }
        if !is_valid_collection_name(&self.persistence.collection) {
            return Err(StatusError::Config(format!(
                "invalid collection name '{}'",
                self.persistence.collection
            )));
        }
        Ok(())
    }

    fn validate_intervals(&self) -> Result<(), StatusError> {
        if self.ingestor.heartbeat_interval_secs == 0 {
            return Err(StatusError::Config(
                "ingestor heartbeat_interval_secs must be at least 1".into(),
            ));
        }
        if self.retention.days == 0 {
            return Err(StatusError::Config("retention days must be at least 1".into()));
        }
        Ok(())
    }
}

/// Collection names end up as SQL identifiers: `[A-Za-z_][A-Za-z0-9_]*`, at most 63 bytes.
pub fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= 63
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
