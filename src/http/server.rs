//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (panic catcher, CORS, correlation id, security headers, tracing)
//! - Bind server to listener and drain on shutdown
//! - Dispatch requests: upstream lookup → auth gate → forwarder

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::auth::{AuthGate, JwtVerifier};
use crate::config::{ConfigError, CorsConfig, GatewayConfig};
use crate::errors::GatewayError;
use crate::http::proxy::{Forwarder, HyperTransport, Transport};
use crate::http::request::propagate_request_id;
use crate::resilience::RetryPolicy;
use crate::routing::{RouteTable, UpstreamRouter};
use crate::security::{answer_options, cors_layer, security_headers};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub upstreams: Arc<UpstreamRouter>,
    pub forwarder: Arc<Forwarder>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server that forwards over real HTTP connections.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let upstreams = compile_upstreams(&config)?;
        let transport = Arc::new(HyperTransport::new(&upstreams));
        Ok(Self::assemble(config, upstreams, transport))
    }

    /// Create a server that forwards through `transport`.
    pub fn with_transport(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        let upstreams = compile_upstreams(&config)?;
        Ok(Self::assemble(config, upstreams, transport))
    }

    fn assemble(
        config: GatewayConfig,
        upstreams: UpstreamRouter,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let gate = AuthGate::new(RouteTable::standard(), JwtVerifier::new(&config.auth.jwt_secret));
        let forwarder = Forwarder::new(
            transport,
            RetryPolicy::from_config(&config.retries),
            config.security.max_body_size,
        );

        let state = AppState {
            gate: Arc::new(gate),
            upstreams: Arc::new(upstreams),
            forwarder: Arc::new(forwarder),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Innermost first: panic catcher, OPTIONS answer, CORS, correlation id,
    /// security headers, tracing.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let routes = Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state);

        with_edge_layers(routes, &config.cors)
    }

    /// The assembled router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            retries = self.config.retries.max_attempts,
            base_delay_ms = self.config.retries.base_delay_ms,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Wrap `routes` in the edge middleware stack.
fn with_edge_layers(routes: Router, cors: &CorsConfig) -> Router {
    let mut router = routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(answer_options))
        .layer(cors_layer(cors))
        .layer(middleware::from_fn(propagate_request_id));

    for (name, value) in security_headers() {
        router = router.layer(SetResponseHeaderLayer::overriding(name, value));
    }

    router.layer(TraceLayer::new_for_http())
}

fn compile_upstreams(config: &GatewayConfig) -> Result<UpstreamRouter, ConfigError> {
    UpstreamRouter::from_config(&config.upstreams).map_err(|e| ConfigError::Validation(vec![e]))
}

/// Main gateway handler.
/// Looks up the upstream, runs the auth gate where it applies, and forwards.
async fn dispatch(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();

    let Some(upstream) = state.upstreams.match_path(&path) else {
        tracing::warn!(method = %request.method(), path = %path, "No route matched");
        return GatewayError::RouteNotFound.into_response();
    };

    if upstream.kind.is_gated() {
        match state.gate.authorize(request.method(), &path, request.headers()) {
            Ok(Some(claims)) => {
                request.extensions_mut().insert(claims);
            }
            Ok(None) => {}
            Err(e) => return e.into_response(),
        }
    }

    state.forwarder.forward(request, upstream).await
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    GatewayError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("handler bug with secret detail");
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_generic_envelope() {
        let routes = Router::new().route("/{*path}", any(explode));
        let app = with_edge_layers(routes, &CorsConfig::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/posts/1")
                    .header("x-request-id", "req_panic_1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let headers = response.headers();
        assert_eq!(headers["x-request-id"], "req_panic_1");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-xss-protection"], "1; mode=block");
        assert_eq!(headers["x-powered-by"], "API-Gateway");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "success": false, "message": "Internal server error" }));
    }

    #[test]
    fn test_panic_payloads_are_not_exposed() {
        let response = handle_panic(Box::new(String::from("pool exhausted at 0x7f")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(42u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
