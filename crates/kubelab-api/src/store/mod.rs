//! Key-value store abstraction
//!
//! Defines the `KeyValueStore` trait that decouples item persistence from any
//! specific backend. Production runs against Redis; tests and `memory://` local
//! runs use the in-process map.

mod memory;
mod redis_backend;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

pub use self::memory::MemoryStore;
pub use self::redis_backend::RedisStore;

/// URL scheme selecting the in-memory store
pub const MEMORY_URL_SCHEME: &str = "memory://";

/// Minimal key-value operations needed for item persistence.
///
/// Each call is an independent round trip; implementations provide per-key
/// atomicity only.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value, `None` if the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any existing one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Whether a key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// All keys starting with `prefix`
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Trivial round trip used for liveness
    async fn ping(&self) -> Result<()>;
}

/// Connect to the store selected by `url`.
///
/// `memory://` yields an empty in-process store; anything else is handed to the
/// Redis client, with `password` overriding any credential in the URL.
pub async fn connect(url: &str, password: Option<&str>) -> Result<Arc<dyn KeyValueStore>> {
    if url.starts_with(MEMORY_URL_SCHEME) {
        return Ok(Arc::new(MemoryStore::new()));
    }

    if !url.starts_with("redis://") && !url.starts_with("rediss://") {
        return Err(Error::Config(format!(
            "unsupported store url '{}', expected redis://, rediss:// or memory://",
            url
        )));
    }

    let store = RedisStore::connect(url, password).await?;
    Ok(Arc::new(store))
}
