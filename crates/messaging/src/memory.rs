//! In-process message bus on a tokio broadcast channel.
//!
//! Every subscriber sees every published message once, subject to its topic
//! prefixes. Used for single-process setups and for tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::error::MessagingError;
use crate::message::Message;
use crate::subscription::Subscription;
use crate::traits::{EventPublisher, EventSubscriber, MessageHandler, MessageSubscriber};

/// Default number of messages buffered per subscriber before it lags.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct MemoryBus {
    sender: broadcast::Sender<Message>,
}

impl MemoryBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A new receiver with no topic prefixes yet (receives nothing until subscribed).
    pub fn subscriber(&self) -> MemorySubscriber {
        MemorySubscriber {
            receiver: Mutex::new(self.sender.subscribe()),
            prefixes: Mutex::new(Vec::new()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl EventPublisher for MemoryBus {
    /// Publishing with no subscribers is not an error; the message is discarded.
    async fn publish(&self, message: Message) -> Result<(), MessagingError> {
        let topic = message.topic.clone();
        match self.sender.send(message) {
            Ok(receivers) => debug!(topic = %topic, receivers, "published message"),
            Err(_) => debug!(topic = %topic, "published message with no subscribers"),
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSubscriber for MemoryBus {
    async fn subscribe(
        &self,
        topic: &str,
        handler: MessageHandler,
    ) -> Result<Subscription, MessagingError> {
        let subscriber = self.subscriber();
        EventSubscriber::subscribe(&subscriber, topic).await?;
        Ok(Subscription::spawn(Arc::new(subscriber), topic, handler))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Receiving end of a [`MemoryBus`].
pub struct MemorySubscriber {
    receiver: Mutex<broadcast::Receiver<Message>>,
    prefixes: Mutex<Vec<String>>,
}

#[async_trait]
impl EventSubscriber for MemorySubscriber {
    /// An empty prefix subscribes to all topics.
    async fn subscribe(&self, topic_prefix: &str) -> Result<(), MessagingError> {
        self.prefixes.lock().await.push(topic_prefix.to_string());
        Ok(())
    }

    async fn recv(&self) -> Result<Message, MessagingError> {
        let mut receiver = self.receiver.lock().await;
        loop {
            match receiver.recv().await {
                Ok(msg) => {
                    let prefixes = self.prefixes.lock().await;
                    if prefixes.iter().any(|p| msg.topic.starts_with(p.as_str())) {
                        return Ok(msg);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "memory subscriber lagged, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(MessagingError::Closed),
            }
        }
    }
}
