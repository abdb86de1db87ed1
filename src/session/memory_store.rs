use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::session::store::{SessionStore, SessionStoreError};

/// Process-local session store. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing value, e.g. a snapshot from a previous request.
    pub fn with_value(key: &str, value: Value) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), value);
        Self {
            values: Arc::new(Mutex::new(values)),
        }
    }

    pub async fn len(&self) -> usize {
        self.values.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, SessionStoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), SessionStoreError> {
        debug!("Storing session value under '{}'", key);
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), SessionStoreError> {
        debug!("Forgetting session value under '{}'", key);
        self.values.lock().await.remove(key);
        Ok(())
    }
}
