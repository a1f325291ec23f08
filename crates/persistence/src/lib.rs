pub mod backend;
pub mod error;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod store;

pub use backend::open_store;
pub use error::PersistenceError;
pub use filter::{Comparison, RecordFilter};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::RecordStore;
