use super::{DocumentStore, StoreError};
use crate::models::{Inventory, Profile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local store for single-node runs and tests.
///
/// Writes replace the whole document, matching the MongoDB store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<String, Profile>>>,
    inventories: Arc<RwLock<HashMap<String, Inventory>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn profile_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn inventory_count(&self) -> usize {
        self.inventories.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn put_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_inventory(&self, user_id: &str) -> Result<Option<Inventory>, StoreError> {
        Ok(self.inventories.read().await.get(user_id).cloned())
    }

    async fn put_inventory(&self, inventory: &Inventory) -> Result<(), StoreError> {
        self.inventories
            .write()
            .await
            .insert(inventory.id.clone(), inventory.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
