pub mod lmdb_storage;
pub mod manager;

pub use lmdb_storage::LmdbStorage;
pub use manager::StorageManager;
