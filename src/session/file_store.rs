use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::session::store::{SessionStore, SessionStoreError};

/// Session store backed by a single JSON file holding a `key -> value` object.
///
/// Every write reads the file, updates one key and writes the whole object back, so
/// other keys in the same file are preserved.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>, SessionStoreError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(Map::new());
        }

        let contents = fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&contents)? {
            Value::Object(values) => Ok(values),
            _ => Err(SessionStoreError::Corrupt {
                path: self.path.clone(),
            }),
        }
    }

    async fn write(&self, values: &Map<String, Value>) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json).await?;
        debug!("Wrote session file {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, SessionStoreError> {
        let mut values = self.load().await?;
        Ok(values.remove(key))
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), SessionStoreError> {
        let mut values = self.load().await?;
        values.insert(key.to_string(), value);
        self.write(&values).await
    }

    async fn forget(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut values = self.load().await?;
        if values.shift_remove(key).is_some() {
            info!("Removed '{}' from session file {}", key, self.path.display());
            self.write(&values).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert_eq!(store.get("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_non_object_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(matches!(
            store.get("cart").await,
            Err(SessionStoreError::Corrupt { .. })
        ));
    }
}
