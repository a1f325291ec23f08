pub mod error;
pub mod ingestor;
pub mod lifecycle;
pub mod retention;
pub mod signals;

pub use error::IngestorError;
pub use ingestor::{IngestorSettings, IngestorStats, StatusIngestor};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use signals::ShutdownSignal;
