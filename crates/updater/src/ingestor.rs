//! The status ingestor: one queue topic bridged into one record collection.
//!
//! ```text
//! queue ──deliver──▶ on_event ──decode ts──▶ RecordStore::insert
//!                        ▲
//! start ── subscribe ────┘, then heartbeat until stop()
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use status_core::{StatusEvent, StatusRecord, UpdaterConfig};
use status_messaging::{handler, Message, MessageHandler, MessageSubscriber, MessagingError};
use status_persistence::RecordStore;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::IngestorError;
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::retention::{self, DEFAULT_RETENTION_DAYS};

// ── Settings ────────────────────────────────────────────────────────

/// Runtime settings, usually derived from [`UpdaterConfig`].
#[derive(Debug, Clone)]
pub struct IngestorSettings {
    /// Topic carrying status events.
    pub topic: String,
    pub heartbeat_interval: Duration,
    /// Bound on waiting for in-flight work once stopped.
    pub shutdown_timeout: Duration,
    pub retention_days: u32,
    /// `None` disables the scheduled retention sweep.
    pub sweep_interval: Option<Duration>,
}

impl Default for IngestorSettings {
    fn default() -> Self {
        Self {
            topic: status_messaging::topics::STATUS.to_string(),
            heartbeat_interval: Duration::from_secs(15),
            shutdown_timeout: Duration::from_secs(10),
            retention_days: DEFAULT_RETENTION_DAYS,
            sweep_interval: Some(Duration::from_secs(3600)),
        }
    }
}

impl IngestorSettings {
    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self {
            topic: config.messaging.queue.clone(),
            heartbeat_interval: config.ingestor.heartbeat_interval(),
            shutdown_timeout: config.ingestor.shutdown_timeout(),
            retention_days: config.retention.days,
            sweep_interval: config.retention.sweep_interval(),
        }
    }
}

// ── Stats ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct IngestorStats {
    stored: AtomicU64,
    rejected: AtomicU64,
    heartbeats: AtomicU64,
    sweeps: AtomicU64,
}

impl IngestorStats {
    /// Records inserted since construction.
    pub fn stored(&self) -> u64 {
        self.stored.load(Ordering::Relaxed)
    }

    /// Events dropped because they could not be decoded or stored.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn heartbeats(&self) -> u64 {
        self.heartbeats.load(Ordering::Relaxed)
    }

    /// Completed scheduled retention sweeps.
    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }
}

// ── StatusIngestor ──────────────────────────────────────────────────

pub struct StatusIngestor {
    subscriber: Arc<dyn MessageSubscriber>,
    store: Arc<dyn RecordStore>,
    settings: IngestorSettings,
    lifecycle: Lifecycle,
    stats: IngestorStats,
}

impl StatusIngestor {
    /// Build an ingestor around already-resolved backends.
    pub fn new(
        subscriber: Arc<dyn MessageSubscriber>,
        store: Arc<dyn RecordStore>,
        settings: IngestorSettings,
    ) -> Self {
        Self {
            subscriber,
            store,
            settings,
            lifecycle: Lifecycle::new(),
            stats: IngestorStats::default(),
        }
    }

    /// Resolve both backends from the config. Fails if either cannot be connected.
    pub async fn connect(config: &UpdaterConfig) -> Result<Self, IngestorError> {
        let subscriber = status_messaging::connect_subscriber(&config.messaging).await?;
        let store = status_persistence::open_store(&config.persistence).await?;
        Ok(Self::new(subscriber, store, IngestorSettings::from_config(config)))
    }

    pub fn settings(&self) -> &IngestorSettings {
        &self.settings
    }

    pub fn stats(&self) -> &IngestorStats {
        &self.stats
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Subscribe and supervise until [`stop`](Self::stop) is called.
    ///
    /// Returns [`IngestorError::Stopped`] without subscribing if the ingestor
    /// was stopped before it started.
    pub async fn start(self: &Arc<Self>) -> Result<(), IngestorError> {
        self.lifecycle.begin()?;
        info!(
            topic = %self.settings.topic,
            messaging = self.subscriber.backend(),
            persistence = self.store.backend(),
            collection = %self.store.collection(),
            "starting status updater"
        );

        let subscription = match self
            .subscriber
            .subscribe(&self.settings.topic, self.event_handler())
            .await
        {
            Ok(subscription) => subscription,
            Err(e) => {
                self.lifecycle.stop();
                return Err(e.into());
            }
        };

        let sweeper = self.settings.sweep_interval.map(|interval| {
            let this = self.clone();
            tokio::spawn(async move { this.sweep_loop(interval).await })
        });

        self.supervise().await;

        subscription.close(self.settings.shutdown_timeout).await;
        if let Some(mut handle) = sweeper {
            if tokio::time::timeout(self.settings.shutdown_timeout, &mut handle)
                .await
                .is_err()
            {
                warn!("retention sweep still running at shutdown, aborting it");
                handle.abort();
            }
        }

        info!(
            stored = self.stats.stored(),
            rejected = self.stats.rejected(),
            heartbeats = self.stats.heartbeats(),
            "status updater stopped"
        );
        Ok(())
    }

    /// Request shutdown. Safe to call from any task, any number of times.
    pub fn stop(&self, reason: &str) {
        match self.lifecycle.stop() {
            LifecycleState::Stopped => info!(reason, "status updater already stopping"),
            previous => info!(reason, from = %previous, "stopping status updater"),
        }
    }

    /// Decode `ts` and insert the record. One event, one insert.
    pub async fn on_event(&self, event: StatusEvent) -> Result<(), IngestorError> {
        let record = StatusRecord::from_event(event)?;
        debug!(ts = %record.ts, fields = record.fields.len(), "storing status record");
        self.store.insert(record).await?;
        self.stats.stored.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Delete records older than `retention_days` days from now.
    pub async fn cleanup_old_entries(&self, retention_days: u32) -> Result<u64, IngestorError> {
        retention::cleanup_old_entries(self.store.as_ref(), retention_days).await
    }

    /// Delete records older than `retention_days` days before `now`.
    pub async fn cleanup_old_entries_at(
        &self,
        now: DateTime<Utc>,
        retention_days: u32,
    ) -> Result<u64, IngestorError> {
        retention::cleanup_old_entries_at(self.store.as_ref(), now, retention_days).await
    }

    /// Unpack the envelope and hand the event to [`on_event`](Self::on_event).
    async fn handle_message(&self, msg: Message) -> Result<(), IngestorError> {
        let event: StatusEvent = msg.decode().map_err(MessagingError::Deserialization)?;
        self.on_event(event).await
    }

    /// Handler for the delivery task. A failure is counted here and reported
    /// to the delivery task, which logs it and moves on to the next message.
    fn event_handler(self: &Arc<Self>) -> MessageHandler {
        let this = self.clone();
        handler(move |msg: Message| {
            let this = this.clone();
            async move {
                this.handle_message(msg).await.map_err(|e| {
                    this.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    MessagingError::handler(e)
                })
            }
        })
    }

    /// Heartbeat until stopped. A stop wakes the loop immediately.
    async fn supervise(&self) {
        while self.lifecycle.is_running() {
            tokio::select! {
                biased;
                _ = self.lifecycle.stopped() => break,
                _ = tokio::time::sleep(self.settings.heartbeat_interval) => {
                    let beat = self.stats.heartbeats.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(
                        heartbeat = beat,
                        stored = self.stats.stored(),
                        rejected = self.stats.rejected(),
                        "heartbeat status updater"
                    );
                }
            }
        }
    }

    /// Scheduled retention sweep. The first sweep runs one interval after start.
    async fn sweep_loop(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        info!(?interval, retention_days = self.settings.retention_days, "retention sweeper started");

        loop {
            tokio::select! {
                biased;
                _ = self.lifecycle.stopped() => break,
                _ = ticker.tick() => {
                    match self.cleanup_old_entries(self.settings.retention_days).await {
                        Ok(_) => {
                            self.stats.sweeps.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => error!(error = %e, "retention sweep failed"),
                    }
                }
            }
        }
    }
}
