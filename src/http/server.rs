//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build every subsystem from config (store, blocklist, forwarder)
//! - Create Axum Router with all handlers
//! - Wire up middleware (CORS, timeout, body limit, request ID, tracing)
//! - Serve with peer addresses and graceful shutdown

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    routing::{get, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::{AppConfig, CorsConfig};
use crate::domains::DomainResolver;
use crate::http::handlers;
use crate::http::request::{self, MakeRequestUuid};
use crate::lifecycle::shutdown;
use crate::lookup::LookupService;
use crate::referrer::{BlocklistError, ReferrerClassifier, SpyBlocklist};
use crate::store::{DomainStore, SqliteStore, StoreError};
use crate::tracking::{ForwardError, TrackingForwarder};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<LookupService>,
}

impl AppState {
    pub fn blocklist(&self) -> &Arc<SpyBlocklist> {
        self.lookup.classifier().blocklist()
    }
}

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open domain store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to load spy domains: {0}")]
    Blocklist(#[from] BlocklistError),

    #[error("failed to build tracking client: {0}")]
    Tracking(#[from] ForwardError),

    #[error("invalid CORS origin '{0}'")]
    CorsOrigin(String),
}

/// HTTP server for the campaign relay.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Open the configured SQLite database and build the server.
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        let store = SqliteStore::open(&config.storage.database_path)?;
        Self::with_store(config, Arc::new(store))
    }

    /// Build the server around an existing store.
    pub fn with_store(config: AppConfig, store: Arc<dyn DomainStore>) -> Result<Self, StartupError> {
        let blocklist = Arc::new(SpyBlocklist::from_config(&config.spy)?);
        let forwarder = TrackingForwarder::new(config.tracking.clone())?;

        tracing::info!(
            spy_entries = blocklist.len(),
            tracking_host = config.tracking.host_override.as_deref().unwrap_or("<subdomain>.<domain>"),
            tracking_timeout_ms = config.tracking.timeout_ms,
            "Subsystems initialized"
        );

        let lookup = LookupService::new(
            DomainResolver::new(store),
            ReferrerClassifier::new(blocklist),
            forwarder,
        );
        let state = AppState {
            lookup: Arc::new(lookup),
        };

        let router = Self::build_router(&config, state.clone())?;
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Result<Router, StartupError> {
        let api = Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/api/domains",
                get(handlers::list_domains).post(handlers::create_domain),
            )
            .route(
                "/api/domains/test",
                get(handlers::lookup_get).post(handlers::lookup_post),
            )
            .route(
                "/api/domains/{id}",
                put(handlers::update_domain).delete(handlers::delete_domain),
            )
            .with_state(state.clone());

        Ok(api
            .merge(setup_admin_router(state))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(cors_layer(&config.cors)?)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request::request_id(req.headers()),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid)))
    }

    /// Router without a listener, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, StartupError> {
    let origins = config
        .allowed_origins
        .iter()
        .map(|o| HeaderValue::from_str(o).map_err(|_| StartupError::CorsOrigin(o.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::REFERER,
            HeaderName::from_static("referrer"),
        ])
        .allow_credentials(config.allow_credentials))
}
