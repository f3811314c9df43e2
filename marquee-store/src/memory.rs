use std::collections::HashMap;

use async_trait::async_trait;
use marquee_core::storage::{KeyValueStore, StorageError};
use tokio::sync::RwLock;

/// Process-local key-value store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Memory store whose writes under one key prefix always fail
#[cfg(test)]
pub(crate) struct FailingWrites {
    inner: MemoryStore,
    prefix: &'static str,
}

#[cfg(test)]
impl FailingWrites {
    pub(crate) fn new(prefix: &'static str) -> Self {
        Self {
            inner: MemoryStore::new(),
            prefix,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl KeyValueStore for FailingWrites {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if key.starts_with(self.prefix) {
            return Err(StorageError::Backend("write refused".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.keys_with_prefix(prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::storage::{get_json, set_json};

    #[tokio::test]
    async fn test_basic_operations() {
        let store = MemoryStore::new();
        store.set("ticket:1", "{}").await.unwrap();
        store.set("ticket:2", "{}").await.unwrap();
        store.set("occupancy:S1", "{}").await.unwrap();

        let mut keys = store.keys_with_prefix("ticket:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["ticket:1", "ticket:2"]);

        store.remove("ticket:1").await.unwrap();
        assert!(store.get("ticket:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_json_is_reported() {
        let store = MemoryStore::new();
        store.set("k", "not json").await.unwrap();
        let err = get_json::<Vec<String>>(&store, "k").await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));

        set_json(&store, "k", &vec!["a".to_string()]).await.unwrap();
        let value: Option<Vec<String>> = get_json(&store, "k").await.unwrap();
        assert_eq!(value, Some(vec!["a".to_string()]));
    }
}
