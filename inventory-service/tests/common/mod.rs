#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use inventory_service::events::{EventDispatcher, ProfileProvisioner};
use inventory_service::models::{Inventory, Profile};
use inventory_service::services::{
    DocumentStore, GeminiClient, JwtVerifier, MemoryStore, StoreError,
};
use inventory_service::startup::{build_router, AppState};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::middleware::hook_signature::{
    HookSignatureConfig, HOOK_SIGNATURE_HEADER, HOOK_TIMESTAMP_HEADER,
};
use service_core::utils::signature::sign_hook;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};
use tower::ServiceExt;

pub const TEST_SIGNING_SECRET: &[u8] = b"integration-test-secret";
pub const TEST_USER_ID: &str = "test_user_123";

/// Memory store that counts reads and can be told to fail or to stall
/// profile writes until released.
#[derive(Clone)]
pub struct ObservedStore {
    pub inner: MemoryStore,
    pub inventory_reads: Arc<AtomicUsize>,
    pub fail: Arc<AtomicBool>,
    hold: Arc<AtomicBool>,
    entered: Arc<Notify>,
    gate: Arc<Semaphore>,
}

impl Default for ObservedStore {
    fn default() -> Self {
        Self {
            inner: MemoryStore::default(),
            inventory_reads: Arc::default(),
            fail: Arc::default(),
            hold: Arc::default(),
            entered: Arc::new(Notify::new()),
            gate: Arc::new(Semaphore::new(0)),
        }
    }
}

impl ObservedStore {
    pub fn hold_writes(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Resolves once a profile write is parked behind [`Self::hold_writes`].
    pub async fn held_write(&self) {
        self.entered.notified().await;
    }

    pub fn release_writes(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.gate.add_permits(1);
    }

    pub fn reads(&self) -> usize {
        self.inventory_reads.load(Ordering::SeqCst)
    }

    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("induced failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for ObservedStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        self.check()?;
        self.inner.get_profile(user_id).await
    }

    async fn put_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        if self.hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            let _permit = self.gate.acquire().await;
        }
        self.check()?;
        self.inner.put_profile(profile).await
    }

    async fn get_inventory(&self, user_id: &str) -> Result<Option<Inventory>, StoreError> {
        self.inventory_reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_inventory(user_id).await
    }

    async fn put_inventory(&self, inventory: &Inventory) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_inventory(inventory).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check()
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: ObservedStore,
}

pub struct TestAppBuilder {
    hook_secret: Option<String>,
    gemini_key: Option<String>,
    queue_size: usize,
}

impl TestAppBuilder {
    pub fn hook_secret(mut self, secret: &str) -> Self {
        self.hook_secret = Some(secret.to_string());
        self
    }

    pub fn queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    pub fn gemini_key(mut self, key: &str) -> Self {
        self.gemini_key = Some(key.to_string());
        self
    }

    pub fn spawn(self) -> TestApp {
        let store = ObservedStore::default();
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());

        let provisioner = ProfileProvisioner::new(shared.clone());
        let (dispatcher, events) = EventDispatcher::new(provisioner, self.queue_size);
        tokio::spawn(dispatcher.run());

        let genai = GeminiClient::from_config(&inventory_service::config::GenaiConfig {
            api_key: self.gemini_key.map(Secret::new),
            model: "gemini-2.0-flash".to_string(),
        });

        let state = AppState::new(
            shared,
            Arc::new(JwtVerifier::from_secret(TEST_SIGNING_SECRET)),
            events,
            genai,
        );
        let hooks = HookSignatureConfig::new(self.hook_secret.map(Secret::new));

        TestApp {
            router: build_router(state, hooks),
            store,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            hook_secret: None,
            gemini_key: None,
            queue_size: 64,
        }
    }

    pub fn spawn() -> Self {
        Self::builder().spawn()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get_inventory(&self, authorization: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri("/inventory");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_user_created(&self, body: &str) -> (StatusCode, Value) {
        self.post_hook(body, None, None).await
    }

    /// Posts `body` signed with `secret` at the current time.
    pub async fn post_signed_user_created(&self, body: &str, secret: &str) -> (StatusCode, Value) {
        let timestamp = Utc::now().timestamp();
        let signature = sign_hook(secret, timestamp, body.as_bytes()).unwrap();
        self.post_hook(body, Some(timestamp), Some(&signature)).await
    }

    pub async fn post_hook(
        &self,
        body: &str,
        timestamp: Option<i64>,
        signature: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/events/user-created")
            .header("content-type", "application/json");
        if let Some(ts) = timestamp {
            builder = builder.header(HOOK_TIMESTAMP_HEADER, ts.to_string());
        }
        if let Some(sig) = signature {
            builder = builder.header(HOOK_SIGNATURE_HEADER, sig);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Polls until the provisioner has written both documents for `uid`.
    pub async fn wait_for_provisioning(&self, uid: &str) -> (Profile, Inventory) {
        for _ in 0..100 {
            let profile = self.store.inner.get_profile(uid).await.unwrap();
            let inventory = self.store.inner.get_inventory(uid).await.unwrap();
            if let (Some(profile), Some(inventory)) = (profile, inventory) {
                return (profile, inventory);
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }
        panic!("user {} was not provisioned in time", uid);
    }
}

pub fn token_for(uid: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "sub": uid,
            "exp": (Utc::now() + Duration::minutes(30)).timestamp(),
            "iat": Utc::now().timestamp(),
        }),
        &EncodingKey::from_secret(TEST_SIGNING_SECRET),
    )
    .unwrap()
}

pub fn bearer(uid: &str) -> String {
    format!("Bearer {}", token_for(uid))
}
