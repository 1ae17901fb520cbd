//! MongoDB store tests. Need a MongoDB reachable at `MONGODB_URI`
//! (default `mongodb://localhost:27017`).

use chrono::Utc;
use inventory_service::models::{Inventory, Profile, UserCreatedEvent};
use inventory_service::services::{DocumentStore, MongoStore};
use mongodb::bson::{doc, Document};
use mongodb::{Client, Database};
use serde_json::json;

/// The store under test plus a raw handle on the same database.
async fn connect() -> (MongoStore, Database) {
    let uri =
        std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = format!("inventory_test_{}", Utc::now().timestamp_nanos_opt().unwrap_or(0));
    let store = MongoStore::connect(&uri, &db_name)
        .await
        .expect("Failed to connect to MongoDB");
    let raw = Client::with_uri_str(&uri)
        .await
        .expect("Failed to connect to MongoDB")
        .database(&db_name);
    (store, raw)
}

async fn cleanup(raw: &Database) {
    let _ = raw.drop(None).await;
}

#[tokio::test]
#[ignore = "Requires MongoDB"]
async fn round_trips_profile_and_inventory() {
    let (store, raw) = connect().await;

    let profile = Profile::from_event(
        &UserCreatedEvent::new("u1").with_email("u1@example.com"),
        Utc::now(),
    );
    store.put_profile(&profile).await.unwrap();
    let stored = store.get_profile("u1").await.unwrap().unwrap();
    assert_eq!(stored.display_name, "New User");
    assert_eq!(stored.email.as_deref(), Some("u1@example.com"));

    let mut inventory = Inventory::empty("u1");
    inventory.cards = vec![json!({"name": "Vulpix", "count": 3}), json!({"name": "Psyduck"})];
    store.put_inventory(&inventory).await.unwrap();
    assert_eq!(store.get_inventory("u1").await.unwrap(), Some(inventory));

    assert!(store.get_inventory("missing").await.unwrap().is_none());

    cleanup(&raw).await;
}

#[tokio::test]
#[ignore = "Requires MongoDB"]
async fn put_replaces_instead_of_merging() {
    let (store, raw) = connect().await;

    raw.collection::<Document>("inventories")
        .insert_one(doc! { "_id": "u1", "userId": "u1", "cards": [ { "name": "Ditto" } ], "extra": true }, None)
        .await
        .unwrap();

    store.put_inventory(&Inventory::empty("u1")).await.unwrap();

    let stored = raw
        .collection::<Document>("inventories")
        .find_one(doc! { "_id": "u1" }, None)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.get("extra").is_none());
    assert!(stored.get_array("cards").unwrap().is_empty());

    cleanup(&raw).await;
}

#[tokio::test]
#[ignore = "Requires MongoDB"]
async fn health_check_pings_server() {
    let (store, raw) = connect().await;
    store.health_check().await.unwrap();
    cleanup(&raw).await;
}
