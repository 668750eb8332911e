use std::fmt;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use super::{StoreClient, StoreConnector};
use crate::config::StoreConfig;
use crate::error::{Error, StoreError};

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

/// Store client backed by a real Redis server.
///
/// Uses a `ConnectionManager`, which reconnects on its own. A blocking pop
/// occupies the underlying connection, so one `RedisStore` belongs to one
/// producer or worker loop; run N loops with N queues.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Open a client from an explicit `redis://` URL.
    ///
    /// URL parsing problems are [`Error::Config`] (fatal, no I/O has
    /// happened yet); a refused connection is [`Error::Store`].
    pub async fn open(url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(url).map_err(|err| Error::Config(err.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|err| Error::Store(StoreError::Connection(err.to_string())))?;
        Ok(RedisStore { conn })
    }
}

#[async_trait]
impl StoreClient for RedisStore {
    async fn info(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("INFO").query_async(&mut conn).await?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.keys::<_, Vec<String>>(pattern).await?)
    }

    async fn list_len(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.llen::<_, usize>(key).await?)
    }

    async fn push_left(&self, key: &str, values: Vec<Vec<u8>>) -> Result<usize, StoreError> {
        if values.is_empty() {
            return self.list_len(key).await;
        }
        let mut conn = self.conn.clone();
        Ok(conn.lpush::<_, _, usize>(key, values).await?)
    }

    async fn pop_right(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.rpop::<_, Option<Vec<u8>>>(key, None).await?)
    }

    async fn pop_right_blocking(
        &self,
        keys: &[String],
        timeout_secs: u64,
    ) -> Result<Option<(String, Vec<u8>)>, StoreError> {
        let mut conn = self.conn.clone();
        // BRPOP with timeout 0 blocks until data arrives.
        let mut cmd = redis::cmd("BRPOP");
        for key in keys {
            cmd.arg(key);
        }
        cmd.arg(timeout_secs);
        Ok(cmd
            .query_async::<_, Option<(String, Vec<u8>)>>(&mut conn)
            .await?)
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        Ok(conn.del::<_, usize>(keys.to_vec()).await?)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.expire::<_, bool>(key, seconds as i64).await?)
    }
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

/// Connector producing [`RedisStore`] clients from a [`StoreConfig`].
pub struct RedisConnector;

#[async_trait]
impl StoreConnector for RedisConnector {
    type Client = RedisStore;

    async fn open(&self, config: &StoreConfig) -> Result<RedisStore, Error> {
        debug!(host = %config.host, port = config.port, db = config.db, "opening redis store");
        RedisStore::open(&config.redis_url()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unparseable_url_is_a_config_error() {
        let err = RedisStore::open("definitely not a url").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
