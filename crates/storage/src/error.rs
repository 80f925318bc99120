// Path: crates/storage/src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("key not found")]
    NotFound,
}

impl From<StorageError> for jarnet_types::error::StateError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Backend(msg) => jarnet_types::error::StateError::Backend(msg),
            StorageError::NotFound => jarnet_types::error::StateError::KeyNotFound,
        }
    }
}
