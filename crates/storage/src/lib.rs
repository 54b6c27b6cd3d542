pub mod ancestry;
pub mod blocks;
pub mod boards;
pub mod codec;
pub mod config;
pub mod dialect;
pub mod error;
pub mod migration;
pub mod query;
pub mod rewrite;
pub mod schema;
pub mod sqlite;
pub mod store;
pub mod traits;

pub use ancestry::MAX_SEARCH_DEPTH;
pub use config::StoreConfig;
pub use dialect::{DbType, Dialect};
pub use error::StorageError;
pub use sqlite::SqliteStorage;
pub use store::SqlStore;
pub use traits::*;
