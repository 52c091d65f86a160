pub mod memory;
pub mod postgres;
pub mod repository;
pub mod trait_def;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
pub use repository::Repository;
pub use trait_def::{CoreStore, RelationalExtras, StorageError, StorageResult};
