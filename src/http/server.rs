//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all handler
//! - Wire up middleware (tracing, body limits)
//! - Bind server to listener
//! - Hand every request to the failover dispatcher

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::failover::{CandidateList, FailoverDispatcher, HttpUpstream, InboundRequest, Upstream};
use crate::http::request::{buffer_body, request_id};
use crate::observability::metrics;

/// Application state injected into handlers.
pub struct AppState<U> {
    pub dispatcher: Arc<FailoverDispatcher<U>>,
    pub max_body_bytes: usize,
}

impl<U> Clone for AppState<U> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

/// HTTP server for the failover gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a server that forwards over HTTP(S).
    ///
    /// Fails if the candidate list cannot be built; the gateway must not
    /// start serving with a bad configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_upstream(config, HttpUpstream::new())
    }

    /// Create a server over an arbitrary transport.
    pub fn with_upstream<U: Upstream>(config: GatewayConfig, upstream: U) -> Result<Self, GatewayError> {
        let candidates = Arc::new(CandidateList::from_config(&config.upstreams)?);
        let dispatcher = FailoverDispatcher::from_config(candidates, upstream, &config.upstreams);

        tracing::info!(
            primary = %dispatcher.candidates().primary(),
            backups = dispatcher.candidates().len() - 1,
            attempt_timeout_ms = dispatcher.attempt_timeout().as_millis() as u64,
            mode = ?dispatcher.mode(),
            "Failover dispatcher ready"
        );

        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            max_body_bytes: config.upstreams.max_body_bytes,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router<U: Upstream>(state: AppState<U>) -> Router {
        let max_body_bytes = state.max_body_bytes;
        Router::new()
            .route("/{*path}", any(proxy_handler::<U>))
            .route("/", any(proxy_handler::<U>))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(RequestBodyLimitLayer::new(max_body_bytes)),
            )
    }

    /// The router, for serving on a custom listener or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
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

/// Main proxy handler.
/// Buffers the request once, then lets the dispatcher walk the candidates.
async fn proxy_handler<U: Upstream>(State(state): State<AppState<U>>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().to_string();

    let (parts, body) = request.into_parts();

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        "Proxying request"
    );

    let body = match buffer_body(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejecting request body");
            let rejection = if e.is_too_large() {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
            } else {
                (StatusCode::BAD_REQUEST, "Request body could not be read")
            };
            metrics::record_request(&method, rejection.0.as_u16(), start_time);
            return rejection.into_response();
        }
    };

    let inbound = InboundRequest::from_parts(&parts, body);
    let response = state.dispatcher.dispatch(&inbound, &request_id).await.into_response();

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}
