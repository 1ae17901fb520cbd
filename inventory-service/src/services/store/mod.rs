//! Document store access for the `users` and `inventories` collections.
//!
//! Handlers only ever fetch one document by key or overwrite one document
//! by key, so that is all the trait offers.

pub mod memory;
pub mod mongo;

use crate::models::{Inventory, Profile};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub const USERS_COLLECTION: &str = "users";
pub const INVENTORIES_COLLECTION: &str = "inventories";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Create or fully replace the profile keyed by `profile.user_id`.
    async fn put_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    async fn get_inventory(&self, user_id: &str) -> Result<Option<Inventory>, StoreError>;

    /// Create or fully replace the inventory keyed by `inventory.id`.
    async fn put_inventory(&self, inventory: &Inventory) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
