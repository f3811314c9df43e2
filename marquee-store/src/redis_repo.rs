use async_trait::async_trait;
use marquee_core::storage::{KeyValueStore, StorageError};
use redis::AsyncCommands;
use tracing::info;

/// Shared key-value store. Every API process pointed at the same Redis sees
/// the same reservations and occupancy logs.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    namespace: String,
}

impl RedisStore {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        // Fail at startup rather than on the first request
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Connected to Redis at {}", connection_string);
        Ok(Self {
            client,
            namespace: "marquee:".to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StorageError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)
    }
}

fn backend(err: redis::RedisError) -> StorageError {
    StorageError::Backend(err.to_string())
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(self.key(key)).await.map_err(backend)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(self.key(key), value).await.map_err(backend)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(self.key(key)).await.map_err(backend)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}*", self.key(prefix));
        let keys: Vec<String> = conn.keys(pattern).await.map_err(backend)?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.namespace).map(str::to_string))
            .collect())
    }
}
