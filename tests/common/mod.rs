//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, Response, StatusCode};
use axum::Router;
use tokio::net::TcpListener;

use failover_gateway::config::GatewayConfig;
use failover_gateway::{GatewayServer, Shutdown};

/// What a mock backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Handle to a running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }
}

/// Start a programmable mock backend.
///
/// `f` receives the zero-based call count and returns status, body and a
/// delay applied before answering. Every response carries `x-served-by`.
pub async fn start_programmable_backend<F, Fut>(name: &'static str, f: F) -> MockBackend
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String, Duration)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let (h, s) = (hits.clone(), seen.clone());
    let app = Router::new().fallback(move |request: Request<Body>| {
        let (hits, seen, f) = (h.clone(), s.clone(), f.clone());
        async move {
            let count = hits.fetch_add(1, Ordering::SeqCst);
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
            seen.lock().unwrap().push(Recorded {
                method: parts.method.to_string(),
                path_and_query: parts.uri.path_and_query().map(|p| p.to_string()).unwrap_or_default(),
                headers: parts.headers,
                body,
            });

            let (status, text, delay) = f(count).await;
            tokio::time::sleep(delay).await;
            Response::builder()
                .status(StatusCode::from_u16(status).unwrap())
                .header("x-served-by", name)
                .header("content-type", "text/plain; charset=utf-8")
                .body(Body::from(text))
                .unwrap()
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, hits, seen }
}

/// Start a mock backend that always returns the same response.
pub async fn start_mock_backend(name: &'static str, status: u16, body: &'static str) -> MockBackend {
    start_programmable_backend(name, move |_| async move { (status, body.to_string(), Duration::ZERO) }).await
}

/// Start a backend that accepts connections and never answers.
pub async fn start_hanging_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });

    MockBackend {
        addr,
        hits,
        seen: Arc::new(Mutex::new(Vec::new())),
    }
}

/// An origin nothing listens on.
pub async fn closed_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn gateway_config(primary: &str, backups: &[String], attempt_timeout_ms: u64) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstreams.primary = primary.to_string();
    config.upstreams.backups = backups.to_vec();
    config.upstreams.attempt_timeout_ms = attempt_timeout_ms;
    config
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = GatewayServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
