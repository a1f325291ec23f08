//! Delivery task driving a [`MessageHandler`] from an [`EventSubscriber`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::MessagingError;
use crate::traits::{EventSubscriber, MessageHandler};

/// Pause after a failed `recv` before trying again.
const RECV_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Counters for one subscription.
#[derive(Debug, Default)]
pub struct SubscriptionStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    ignored: AtomicU64,
}

impl SubscriptionStats {
    /// Messages the handler accepted.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Messages the handler rejected, plus envelopes that could not be decoded.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Messages received on a different topic than the subscribed one.
    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }
}

/// A running subscription. Delivery stops when it is closed or dropped.
pub struct Subscription {
    topic: String,
    shutdown: Arc<Notify>,
    stats: Arc<SubscriptionStats>,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Spawn the delivery task for `topic`.
    ///
    /// Only messages whose topic equals `topic` reach the handler; the
    /// source's prefix filter may let through longer topics.
    pub fn spawn(
        source: Arc<dyn EventSubscriber>,
        topic: impl Into<String>,
        handler: MessageHandler,
    ) -> Self {
        let topic = topic.into();
        let shutdown = Arc::new(Notify::new());
        let stats = Arc::new(SubscriptionStats::default());

        let handle = tokio::spawn(delivery_loop(
            source,
            topic.clone(),
            handler,
            shutdown.clone(),
            stats.clone(),
        ));

        Self {
            topic,
            shutdown,
            stats,
            handle: Some(handle),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn stats(&self) -> &SubscriptionStats {
        &self.stats
    }

    /// Whether the delivery task has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop delivery after the in-flight message and wait up to `timeout`.
    ///
    /// Returns `false` if the task had to be aborted.
    pub async fn close(mut self, timeout: Duration) -> bool {
        self.shutdown.notify_one();
        let Some(mut handle) = self.handle.take() else {
            return true;
        };

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(_) => {
                info!(topic = %self.topic, "subscription closed");
                true
            }
            Err(_) => {
                warn!(topic = %self.topic, ?timeout, "subscription close timed out, aborting delivery");
                handle.abort();
                false
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown.notify_one();
        }
    }
}

async fn delivery_loop(
    source: Arc<dyn EventSubscriber>,
    topic: String,
    handler: MessageHandler,
    shutdown: Arc<Notify>,
    stats: Arc<SubscriptionStats>,
) {
    debug!(topic = %topic, "delivery task started");
    loop {
        tokio::select! {
            result = source.recv() => {
                match result {
                    Ok(msg) if msg.topic != topic => {
                        stats.ignored.fetch_add(1, Ordering::Relaxed);
                        debug!(expected = %topic, got = %msg.topic, "ignoring message on other topic");
                    }
                    Ok(msg) => {
                        let correlation_id = msg.correlation_id;
                        match handler(msg).await {
                            Ok(()) => {
                                stats.delivered.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                stats.failed.fetch_add(1, Ordering::Relaxed);
                                warn!(topic = %topic, %correlation_id, error = %e, "message handler failed, dropping message");
                            }
                        }
                    }
                    Err(MessagingError::Closed) => {
                        info!(topic = %topic, "message source closed, delivery ending");
                        break;
                    }
                    Err(e @ (MessagingError::Deserialization(_) | MessagingError::Transport(_))) => {
                        stats.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(topic = %topic, error = %e, "undecodable message, dropping it");
                    }
                    Err(e) => {
                        warn!(topic = %topic, error = %e, "subscriber recv error");
                        tokio::time::sleep(RECV_RETRY_DELAY).await;
                    }
                }
            }
            _ = shutdown.notified() => {
                debug!(topic = %topic, "delivery task shutting down");
                break;
            }
        }
    }
}
