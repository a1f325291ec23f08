use std::path::Path;

use tracing::info;

use crate::error::StatusError;

use super::types::UpdaterConfig;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

impl UpdaterConfig {
    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, StatusError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StatusError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Defaults plus environment overrides, for running without a config file.
    pub fn from_env() -> Result<Self, StatusError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Log a redacted summary at startup.
    pub fn log_summary(&self) {
        info!(
            backend = %self.messaging.backend,
            endpoint = self.messaging.endpoint.as_deref().unwrap_or("(none)"),
            queue = %self.messaging.queue,
            "messaging config"
        );
        info!(
            backend = %self.persistence.backend,
            url = self.persistence.redacted_url().as_deref().unwrap_or("(none)"),
            collection = %self.persistence.collection,
            "persistence config"
        );
        info!(
            heartbeat_secs = self.ingestor.heartbeat_interval_secs,
            retention_days = self.retention.days,
            sweep_interval_secs = self.retention.sweep_interval_secs,
            "ingestor config"
        );
    }

    // ── Environment variable overrides ──────────────────────────────

    /// Apply environment variable overrides.
    ///
    /// - `STATUS_MESSAGING_BACKEND` -> `messaging.backend`
    /// - `STATUS_MESSAGING_ENDPOINT` -> `messaging.endpoint`
    /// - `STATUS_MESSAGING_QUEUE` -> `messaging.queue`
    /// - `STATUS_PERSISTENCE_BACKEND` -> `persistence.backend`
    /// - `STATUS_PERSISTENCE_URL` -> `persistence.url`
    /// - `STATUS_PERSISTENCE_COLLECTION` -> `persistence.collection`
    /// - `STATUS_HEARTBEAT_INTERVAL` -> `ingestor.heartbeat_interval_secs`
    /// - `STATUS_RETENTION_DAYS` -> `retention.days`
    /// - `STATUS_RETENTION_SWEEP_INTERVAL` -> `retention.sweep_interval_secs`
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable numbers are ignored.
    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("STATUS_MESSAGING_BACKEND") {
            self.messaging.backend = v;
        }
        if let Some(v) = lookup("STATUS_MESSAGING_ENDPOINT") {
            self.messaging.endpoint = Some(v);
        }
        if let Some(v) = lookup("STATUS_MESSAGING_QUEUE") {
            self.messaging.queue = v;
        }
        if let Some(v) = lookup("STATUS_PERSISTENCE_BACKEND") {
            self.persistence.backend = v;
        }
        if let Some(v) = lookup("STATUS_PERSISTENCE_URL") {
            self.persistence.url = Some(v);
        }
        if let Some(v) = lookup("STATUS_PERSISTENCE_COLLECTION") {
            self.persistence.collection = v;
        }
        if let Some(v) = lookup("STATUS_HEARTBEAT_INTERVAL") {
            if let Ok(secs) = v.parse::<u64>() {
                self.ingestor.heartbeat_interval_secs = secs;
            }
        }
        if let Some(v) = lookup("STATUS_RETENTION_DAYS") {
            if let Ok(days) = v.parse::<u32>() {
                self.retention.days = days;
            }
        }
        if let Some(v) = lookup("STATUS_RETENTION_SWEEP_INTERVAL") {
            if let Ok(secs) = v.parse::<u64>() {
                self.retention.sweep_interval_secs = secs;
            }
        }
    }
}
