use crate::config::{InventoryConfig, StoreBackend};
use crate::events::{EventDispatcher, EventQueue, ProfileProvisioner};
use crate::handlers;
use crate::services::{
    DocumentStore, GeminiClient, IdentityVerifier, JwtVerifier, MemoryStore, MongoStore,
};
use axum::{
    http::{header, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    hook_signature::{hook_signature_middleware, HookSignatureConfig},
    metrics::metrics_middleware,
    security_headers::security_headers_middleware,
    tracing::{request_id, request_id_middleware},
};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Everything a handler may touch, built once by the hosting process.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub events: EventQueue,
    pub genai: Option<Arc<GeminiClient>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn IdentityVerifier>,
        events: EventQueue,
        genai: Option<GeminiClient>,
    ) -> Self {
        Self {
            store,
            verifier,
            events,
            genai: genai.map(Arc::new),
        }
    }
}

pub fn build_router(state: AppState, hooks: HookSignatureConfig) -> Router {
    let inventory = get(handlers::get_inventory).post(handlers::get_inventory);

    let hook_routes = Router::new()
        .route("/events/user-created", post(handlers::user_created))
        .route_layer(from_fn_with_state(hooks, hook_signature_middleware));

    Router::new()
        .route("/", inventory.clone())
        .route("/inventory", inventory)
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(hook_routes)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %request_id(request.headers()).unwrap_or("-"),
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: ServerFuture,
    dispatcher: JoinHandle<()>,
    store: Arc<dyn DocumentStore>,
}

impl Application {
    pub async fn build(config: InventoryConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;

        let verifier = JwtVerifier::from_config(&config.identity).map_err(|e| {
            tracing::error!("Failed to initialize identity verifier: {}", e);
            AppError::ConfigError(e)
        })?;

        let genai = GeminiClient::from_config(&config.genai);
        match &genai {
            Some(client) => tracing::info!(model = %client.model(), "Gemini client configured"),
            None => tracing::debug!("GEMINI_API_KEY not set, Gemini client disabled"),
        }

        let provisioner = ProfileProvisioner::new(store.clone());
        let (dispatcher, events) = EventDispatcher::new(provisioner, config.hooks.queue_size);
        let dispatcher = tokio::spawn(dispatcher.run());

        let hooks = HookSignatureConfig::new(config.hooks.signing_secret.clone());
        if !hooks.is_enabled() {
            tracing::warn!("HOOK_SIGNING_SECRET not set, user-created hook is unauthenticated");
        }

        let state = AppState::new(store.clone(), Arc::new(verifier), events, genai);
        let app = build_router(state, hooks);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
            dispatcher,
            store,
        })
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serves until a shutdown signal, then lets queued provisioning finish.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let result = self.server.await;

        if let Err(e) = self.dispatcher.await {
            tracing::error!(error = %e, "Event dispatcher terminated abnormally");
        }

        result
    }
}

async fn connect_store(config: &InventoryConfig) -> Result<Arc<dyn DocumentStore>, AppError> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Mongo => {
            let mongo = config.store.mongodb.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("MongoDB settings missing"))
            })?;
            let store = MongoStore::connect(&mongo.uri, &mongo.database)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    e
                })?;
            Ok(Arc::new(store))
        }
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
