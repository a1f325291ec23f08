pub mod backend;
pub mod error;
pub mod memory;
pub mod message;
pub mod pubsub;
pub mod subscription;
pub mod topics;
pub mod traits;
pub mod transport;

pub use backend::connect_subscriber;
pub use error::MessagingError;
pub use memory::{MemoryBus, MemorySubscriber};
pub use message::Message;
pub use pubsub::{ZmqPublisher, ZmqQueue, ZmqSubscriber};
pub use subscription::{Subscription, SubscriptionStats};
pub use traits::{handler, EventPublisher, EventSubscriber, MessageHandler, MessageSubscriber};
pub use transport::Transport;
