//! Redis fast store backend

use crate::config::schema::StoreConfig;
use crate::error::{HitrateError, HitrateResult};
use crate::store::backend::FastStore;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

/// Redis-backed fast store
///
/// Holds one multiplexed connection, opened lazily by the first call. A
/// failed call drops the connection so the next call opens a fresh one;
/// there is no retry inside a call.
pub struct RedisStore {
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    op_timeout: Duration,
    address: String,
}

impl RedisStore {
    /// Create a store for the configured host and port (does not connect)
    pub fn open(config: &StoreConfig) -> HitrateResult<Self> {
        let client = redis::Client::open(config.url()).map_err(HitrateError::store)?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            op_timeout: config.op_timeout(),
            address: format!("{}:{}", config.host, config.port),
        })
    }

    async fn connection(&self) -> HitrateResult<MultiplexedConnection> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .bounded("CONNECT", self.client.get_multiplexed_async_connection())
            .await?;
        debug!("Opened Redis connection to {}", self.address);
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn invalidate(&self) {
        self.conn.lock().await.take();
    }

    /// Run one Redis future under the per-call timeout
    async fn bounded<T, F>(&self, op: &str, fut: F) -> HitrateResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match timeout(self.op_timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(HitrateError::store(format!("{} failed: {}", op, e))),
            Err(_) => Err(HitrateError::StoreTimeout {
                op: op.to_string(),
                millis: self.op_timeout.as_millis() as u64,
            }),
        }
    }

    /// Drop the cached connection when a call fails
    async fn checked<T>(&self, result: HitrateResult<T>) -> HitrateResult<T> {
        if result.is_err() {
            self.invalidate().await;
        }
        result
    }
}

#[async_trait]
impl FastStore for RedisStore {
    async fn ping(&self) -> HitrateResult<()> {
        let mut conn = self.connection().await?;
        let pong: HitrateResult<String> = self
            .bounded("PING", redis::cmd("PING").query_async(&mut conn))
            .await;

        match self.checked(pong).await? {
            reply if reply.eq_ignore_ascii_case("PONG") => Ok(()),
            reply => Err(HitrateError::StoreProbe(format!(
                "unexpected PING reply: {}",
                reply
            ))),
        }
    }

    async fn get(&self, key: &str) -> HitrateResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let value = self.bounded("GET", conn.get(key)).await;
        self.checked(value).await
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl_secs: u64) -> HitrateResult<()> {
        let mut conn = self.connection().await?;
        let result: HitrateResult<()> = self
            .bounded("SETEX", conn.set_ex(key, value, ttl_secs))
            .await;
        self.checked(result).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> HitrateResult<()> {
        let mut conn = self.connection().await?;
        let result: HitrateResult<()> = self.bounded("SET", conn.set(key, value)).await;
        self.checked(result).await
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }

    fn address(&self) -> String {
        self.address.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_does_not_connect() {
        let config = StoreConfig {
            host: "cache.invalid".to_string(),
            ..StoreConfig::default()
        };
        let store = RedisStore::open(&config).unwrap();
        assert_eq!(store.address(), "cache.invalid:6379");
        assert_eq!(store.backend_name(), "redis");
    }

    #[tokio::test]
    async fn unreachable_host_fails_ping() {
        // Port 1 on loopback refuses connections on any sane test machine
        let config = StoreConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            op_timeout_ms: 200,
            ..StoreConfig::default()
        };
        let store = RedisStore::open(&config).unwrap();
        let err = store.ping().await.unwrap_err();
        assert!(err.is_store_fault());
    }
}
