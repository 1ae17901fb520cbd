use super::{DocumentStore, StoreError, INVENTORIES_COLLECTION, USERS_COLLECTION};
use crate::models::{Inventory, Profile};
use async_trait::async_trait;
use mongodb::{
    bson::doc, options::ReplaceOptions, Client as MongoClient, Collection, Database,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::Internal(anyhow::Error::new(e))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    fn users(&self) -> Collection<Profile> {
        self.db.collection(USERS_COLLECTION)
    }

    fn inventories(&self) -> Collection<Inventory> {
        self.db.collection(INVENTORIES_COLLECTION)
    }

    fn upsert() -> ReplaceOptions {
        ReplaceOptions::builder().upsert(true).build()
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.users().find_one(doc! { "_id": user_id }, None).await?)
    }

    async fn put_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.users()
            .replace_one(doc! { "_id": profile.user_id.as_str() }, profile, Self::upsert())
            .await?;
        Ok(())
    }

    async fn get_inventory(&self, user_id: &str) -> Result<Option<Inventory>, StoreError> {
        Ok(self
            .inventories()
            .find_one(doc! { "_id": user_id }, None)
            .await?)
    }

    async fn put_inventory(&self, inventory: &Inventory) -> Result<(), StoreError> {
        self.inventories()
            .replace_one(doc! { "_id": inventory.id.as_str() }, inventory, Self::upsert())
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::from(e)
            })?;
        Ok(())
    }
}
