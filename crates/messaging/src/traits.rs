use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MessagingError;
use crate::message::Message;
use crate::subscription::Subscription;

/// Publishes messages to every matching subscriber (PUB side).
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a message. Subscribers filter by the message's topic.
    async fn publish(&self, message: Message) -> Result<(), MessagingError>;
}

/// Blanket implementation so `Arc<dyn EventPublisher>` can be used directly.
#[async_trait]
impl<T: EventPublisher + ?Sized> EventPublisher for Arc<T> {
    async fn publish(&self, message: Message) -> Result<(), MessagingError> {
        (**self).publish(message).await
    }
}

/// Socket-level receiving side: topic filters plus a blocking `recv`.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to messages with topics matching the given prefix.
    async fn subscribe(&self, topic_prefix: &str) -> Result<(), MessagingError>;

    /// Receive the next message. Blocks until a message is available.
    ///
    /// Returns [`MessagingError::Closed`] once no more messages can arrive.
    async fn recv(&self) -> Result<Message, MessagingError>;
}

/// Boxed async callback invoked once per delivered message.
pub type MessageHandler = Box<
    dyn Fn(Message) -> Pin<Box<dyn Future<Output = Result<(), MessagingError>> + Send>>
        + Send
        + Sync,
>;

/// Box an async closure into a [`MessageHandler`].
pub fn handler<F, Fut>(f: F) -> MessageHandler
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), MessagingError>> + Send + 'static,
{
    Box::new(move |msg| Box::pin(f(msg)))
}

/// Callback-style subscription capability exposed to the ingestor.
///
/// `subscribe` returns as soon as the subscription is registered. Messages
/// are then handed to `handler` on a task owned by the backend, one at a
/// time, until the returned [`Subscription`] is closed or dropped.
#[async_trait]
pub trait MessageSubscriber: Send + Sync {
    async fn subscribe(
        &self,
        topic: &str,
        handler: MessageHandler,
    ) -> Result<Subscription, MessagingError>;

    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}
