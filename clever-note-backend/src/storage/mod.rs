pub mod tables;
pub mod user_storage;

pub use user_storage::{StorageError, UserStorage};
