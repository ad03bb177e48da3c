pub mod sqlite;
pub mod store;

pub use sqlite::SqliteStore;
pub use store::DataStore;
