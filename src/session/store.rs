use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Session file {} does not hold a JSON object", path.display())]
    Corrupt { path: PathBuf },
}

/// Key-value storage the cart persists itself into.
///
/// Host applications usually back this with their own session layer. Values are plain
/// JSON; the store makes no assumption about their shape and the last write wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, SessionStoreError>;
    async fn put(&self, key: &str, value: Value) -> Result<(), SessionStoreError>;
    async fn forget(&self, key: &str) -> Result<(), SessionStoreError>;
}
