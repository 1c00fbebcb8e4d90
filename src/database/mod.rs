pub mod memory;
pub mod models;
pub mod postgres;
pub mod record;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use record::Record;
pub use store::{Store, StoreError, Table};
