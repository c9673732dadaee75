//! Redis store backend
//!
//! Uses a `ConnectionManager`, which multiplexes one connection across all
//! handlers and reconnects on failure. Clones are cheap and share the connection.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, IntoConnectionInfo};
use tracing::info;

use super::KeyValueStore;
use crate::error::Result;

/// Redis-backed key-value store
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at `url`.
    ///
    /// `password` (from `REDIS_PASSWORD`) takes precedence over a password
    /// embedded in the URL.
    pub async fn connect(url: &str, password: Option<&str>) -> Result<Self> {
        let mut info = url.into_connection_info()?;
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            info.redis.password = Some(password.to_string());
        }

        let client = redis::Client::open(info)?;
        let conn = client.get_connection_manager().await?;

        info!(addr = %client.get_connection_info().addr, "connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists::<_, bool>(key).await?)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.keys::<_, Vec<String>>(format!("{}*", prefix)).await?)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
