//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use edge_gateway::config::GatewayConfig;
use edge_gateway::{HttpServer, Shutdown};
use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use serde_json::json;
use tokio::net::TcpListener;

pub const SECRET: &str = "integration-secret";

/// One request as the upstream saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: &'static str,
    hits: Arc<Mutex<Vec<Captured>>>,
}

/// A loopback upstream that answers every request the same way and records it.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> Vec<Captured> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().unwrap().len()
    }
}

async fn record(State(state): State<MockState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    state.hits.lock().unwrap().push(Captured {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    (
        state.status,
        [("content-type", "application/json")],
        state.body,
    )
        .into_response()
}

/// Start a mock upstream on an ephemeral port.
pub async fn start_mock_upstream(status: u16, body: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(Mutex::new(Vec::new()));

    let state = MockState {
        status: StatusCode::from_u16(status).unwrap(),
        body,
        hits: hits.clone(),
    };
    let app = Router::new()
        .route("/{*path}", any(record))
        .route("/", any(record))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream { addr, hits }
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Config pointing the three upstreams at the given base URLs, with fast retries.
pub fn config_for(identity: &str, content: &str, commentary: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstreams.identity.base_url = identity.to_string();
    config.upstreams.content.base_url = content.to_string();
    config.upstreams.commentary.base_url = commentary.to_string();
    config.auth.jwt_secret = SECRET.to_string();
    config.retries.base_delay_ms = 10;
    config
}

/// Start the gateway on an ephemeral port.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();

    tokio::spawn(async move {
        server.run(listener, receiver).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    (addr, shutdown)
}

/// Sign a token with `secret` that expires `exp_offset` seconds from now.
pub fn mint_token(secret: &str, exp_offset: i64) -> String {
    let exp = (get_current_timestamp() as i64 + exp_offset) as u64;
    encode(
        &Header::default(),
        &json!({ "userId": 5, "username": "ada", "exp": exp }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
