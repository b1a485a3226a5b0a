//! Redis-backed key-value store.
//!
//! Uses a `ConnectionManager`, which reconnects on its own after a dropped
//! connection. Lifetimes map to `SETEX`; untimed writes use plain `SET`.

use crate::config::{GateError, Result};
use crate::store::KvStore;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Store` if the URL is invalid or the server is unreachable.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(store_error)?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(store_error)?;
        Ok(Self { connection })
    }
}

fn store_error(e: redis::RedisError) -> GateError {
    GateError::Store(e.to_string())
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(store_error)
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection.clone();
        match ttl {
            // SETEX rejects a zero lifetime.
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                    .await
            }
            None => conn.set::<_, _, ()>(key, value).await,
        }
        .map_err(store_error)
    }
}
