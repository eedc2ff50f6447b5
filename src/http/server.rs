//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID)
//! - Bind server to listener with graceful shutdown
//!
//! # Design Decisions
//! - Request ID added as early as possible and propagated to responses
//! - All shared state lives in one cloneable AppState

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::access::AccessChecker;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::etag::EtagCoordinator;
use crate::http::handlers;
use crate::lifecycle::Shutdown;
use crate::proxy::ProxyClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ProxyClient>,
    pub etag: EtagCoordinator,
    pub access: AccessChecker,
    /// Machine credential substituted for privileged sub-calls, when set.
    pub m2m_token: Option<String>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Arc::new(ProxyClient::new(&config)?);
        let etag = EtagCoordinator::new(client.clone());
        let access = AccessChecker::new(client.clone(), config.access.clone());

        let state = AppState {
            client,
            etag,
            access,
            m2m_token: config.auth.m2m_token.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/meetings", get(handlers::meetings::list_meetings))
            .route(
                "/meetings/{uid}",
                get(handlers::meetings::get_meeting)
                    .put(handlers::meetings::update_meeting)
                    .delete(handlers::meetings::delete_meeting),
            )
            .route(
                "/meetings/{uid}/registrants",
                post(handlers::registrants::create_registrants)
                    .put(handlers::registrants::update_registrants)
                    .delete(handlers::registrants::delete_registrants),
            )
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until the shutdown coordinator fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstreams = self.config.upstreams.len(),
            "HTTP server starting"
        );

        let mut rx = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
