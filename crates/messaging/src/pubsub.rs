use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use zeromq::prelude::*;
use zeromq::{PubSocket, SubSocket, ZmqMessage};

use crate::error::MessagingError;
use crate::message::Message;
use crate::subscription::Subscription;
use crate::traits::{EventPublisher, EventSubscriber, MessageHandler, MessageSubscriber};
use crate::transport::Transport;

/// ZeroMQ PUB socket, used by status agents (and tests) to emit events.
///
/// Messages are sent as two-frame ZMQ messages:
/// 1. Topic string (used by SUB sockets for prefix filtering)
/// 2. MessagePack-encoded [`Message`] envelope
pub struct ZmqPublisher {
    socket: Mutex<PubSocket>,
}

impl ZmqPublisher {
    /// Connect to an endpoint where a SUB socket (or forwarder) is bound.
    #[instrument(skip_all, fields(endpoint = %transport))]
    pub async fn connect(transport: &Transport) -> Result<Self, MessagingError> {
        let mut socket = PubSocket::new();
        let endpoint = transport.endpoint();
        info!(endpoint = %endpoint, "connecting PUB socket");
        socket.connect(&endpoint).await?;
        Ok(Self {
            socket: Mutex::new(socket),
        })
    }

    /// Bind the PUB socket so subscribers can connect to it directly.
    #[instrument(skip_all, fields(endpoint = %transport))]
    pub async fn bind(transport: &Transport) -> Result<Self, MessagingError> {
        transport.ensure_ipc_dir()?;
        let mut socket = PubSocket::new();
        let endpoint = transport.endpoint();
        info!(endpoint = %endpoint, "binding PUB socket");
        socket.bind(&endpoint).await?;
        Ok(Self {
            socket: Mutex::new(socket),
        })
    }
}

#[async_trait]
impl EventPublisher for ZmqPublisher {
    async fn publish(&self, message: Message) -> Result<(), MessagingError> {
        let topic = message.topic.clone();
        let envelope_bytes = message.to_bytes()?;

        let mut zmq_msg = ZmqMessage::from(topic.as_str());
        zmq_msg.push_back(envelope_bytes.into());

        let mut socket = self.socket.lock().await;
        socket.send(zmq_msg).await?;

        debug!(topic = %topic, "published message");
        Ok(())
    }
}

/// ZeroMQ SUB socket connected to the status publisher (or a forwarder's backend).
pub struct ZmqSubscriber {
    socket: Mutex<SubSocket>,
}

impl ZmqSubscriber {
    #[instrument(skip_all, fields(endpoint = %transport))]
    pub async fn connect(transport: &Transport) -> Result<Self, MessagingError> {
        let mut socket = SubSocket::new();
        let endpoint = transport.endpoint();
        info!(endpoint = %endpoint, "connecting SUB socket");
        socket.connect(&endpoint).await?;
        Ok(Self {
            socket: Mutex::new(socket),
        })
    }
}

#[async_trait]
impl EventSubscriber for ZmqSubscriber {
    /// An empty string subscribes to all topics.
    async fn subscribe(&self, topic_prefix: &str) -> Result<(), MessagingError> {
        let mut socket = self.socket.lock().await;
        socket.subscribe(topic_prefix).await?;
        info!(topic_prefix = %topic_prefix, "subscribed to topic prefix");
        Ok(())
    }

    /// Expects `[topic, envelope]`; a lone frame is taken as the envelope.
    async fn recv(&self) -> Result<Message, MessagingError> {
        let mut socket = self.socket.lock().await;
        let zmq_msg = socket.recv().await?;
        decode_frames(&zmq_msg)
    }
}

fn decode_frames(zmq_msg: &ZmqMessage) -> Result<Message, MessagingError> {
    let frames: Vec<_> = zmq_msg.iter().collect();
    let envelope: &[u8] = match frames.as_slice() {
        [] => return Err(MessagingError::Transport("empty ZMQ message".into())),
        [single] => single.as_ref(),
        [_topic, envelope, ..] => envelope.as_ref(),
    };
    let message = Message::from_bytes(envelope)?;
    debug!(topic = %message.topic, frames = frames.len(), "received message");
    Ok(message)
}

/// Messaging backend "zmq": one SUB socket feeding one callback subscription.
pub struct ZmqQueue {
    subscriber: Arc<ZmqSubscriber>,
    subscribed: AtomicBool,
}

impl ZmqQueue {
    pub async fn connect(transport: &Transport) -> Result<Self, MessagingError> {
        Ok(Self {
            subscriber: Arc::new(ZmqSubscriber::connect(transport).await?),
            subscribed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl MessageSubscriber for ZmqQueue {
    /// A second subscription on the same socket would race the first for
    /// messages, so it is refused.
    async fn subscribe(
        &self,
        topic: &str,
        handler: MessageHandler,
    ) -> Result<Subscription, MessagingError> {
        if self.subscribed.swap(true, Ordering::SeqCst) {
            return Err(MessagingError::AlreadySubscribed(topic.to_string()));
        }
        if let Err(e) = EventSubscriber::subscribe(self.subscriber.as_ref(), topic).await {
            self.subscribed.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(Subscription::spawn(self.subscriber.clone(), topic, handler))
    }

    fn backend(&self) -> &'static str {
        "zmq"
    }
}
