//! Item persistence on top of a key-value store
//!
//! Items live under `todo:<id>` as JSON. There are no secondary indexes: listing
//! and counting scan the whole `todo:` namespace. Updates are read-merge-write
//! with no concurrency guard, so concurrent writers to one id race and the last
//! write wins.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::item::{CreateItem, Item, UpdateItem};
use crate::store::KeyValueStore;

/// Key prefix for item records
pub const ITEM_KEY_PREFIX: &str = "todo:";

fn item_key(id: &str) -> String {
    format!("{}{}", ITEM_KEY_PREFIX, id)
}

/// CRUD operations for items
#[derive(Clone)]
pub struct ItemRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ItemRepository {
    /// Create a repository over the given store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All items, newest first
    pub async fn list(&self) -> Result<Vec<Item>> {
        let keys = self.store.keys(ITEM_KEY_PREFIX).await?;
        let mut items = Vec::with_capacity(keys.len());

        for key in keys {
            // Deleted between the scan and the fetch
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            items.push(serde_json::from_str::<Item>(&raw)?);
        }

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// Fetch one item
    pub async fn get(&self, id: &str) -> Result<Item> {
        let raw = self
            .store
            .get(&item_key(id))
            .await?
            .ok_or_else(|| Error::item_not_found(id))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist a new item with a fresh id
    pub async fn create(&self, input: CreateItem) -> Result<Item> {
        let item = Item::new(Uuid::new_v4().to_string(), input, Utc::now());
        self.write(&item).await?;
        info!(id = %item.id, "item created");
        Ok(item)
    }

    /// Merge `patch` into an existing item
    pub async fn update(&self, id: &str, patch: UpdateItem) -> Result<Item> {
        let mut item = self.get(id).await?;
        item.apply(patch, Utc::now());
        self.write(&item).await?;
        info!(id = %item.id, "item updated");
        Ok(item)
    }

    /// Remove an item
    pub async fn delete(&self, id: &str) -> Result<()> {
        let key = item_key(id);
        if !self.store.exists(&key).await? {
            return Err(Error::item_not_found(id));
        }
        self.store.delete(&key).await?;
        info!(id = %id, "item deleted");
        Ok(())
    }

    /// Number of stored items, by key scan
    pub async fn count(&self) -> Result<usize> {
        Ok(self.store.keys(ITEM_KEY_PREFIX).await?.len())
    }

    /// Store round trip for liveness checks
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    async fn write(&self, item: &Item) -> Result<()> {
        let raw = serde_json::to_string(item)?;
        debug!(id = %item.id, bytes = raw.len(), "writing item");
        self.store.set(&item_key(&item.id), &raw).await
    }
}
