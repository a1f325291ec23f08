use std::sync::Arc;

use status_core::config::{MessagingConfig, BACKEND_MEMORY, BACKEND_ZMQ};
use tracing::info;

use crate::error::MessagingError;
use crate::memory::MemoryBus;
use crate::pubsub::ZmqQueue;
use crate::traits::MessageSubscriber;
use crate::transport::Transport;

/// Resolve and connect the messaging backend named in the config.
///
/// The `memory` backend created here is private to the returned handle;
/// share a [`MemoryBus`] directly to publish into it.
pub async fn connect_subscriber(
    config: &MessagingConfig,
) -> Result<Arc<dyn MessageSubscriber>, MessagingError> {
    match config.backend.as_str() {
        BACKEND_ZMQ => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                MessagingError::Config("messaging backend 'zmq' requires an endpoint".into())
            })?;
            let transport = Transport::parse(endpoint)?;
            let queue = ZmqQueue::connect(&transport).await?;
            info!(endpoint = %transport, queue = %config.queue, "zmq messaging backend ready");
            Ok(Arc::new(queue))
        }
        BACKEND_MEMORY => {
            info!(queue = %config.queue, "memory messaging backend ready");
            Ok(Arc::new(MemoryBus::default()))
        }
        other => Err(MessagingError::UnknownBackend(other.to_string())),
    }
}
