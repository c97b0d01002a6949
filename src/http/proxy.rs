//! Upstream forwarding.
//!
//! # Responsibilities
//! - Buffer the inbound request once so every attempt replays the same bytes
//! - Rewrite the path into the upstream namespace and inject proxy headers
//! - Dispatch through a [`Transport`], retrying transport failures
//! - Turn exhaustion into the 503 envelope
//!
//! # Design Decisions
//! - The retry ladder runs in its own task; a caller that disconnects does
//!   not cancel it
//! - The ladder's result is delivered only through the request's
//!   [`ResponseGuard`], so at most one terminal response is ever written
//! - Received HTTP statuses, 5xx included, are relayed as-is

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use axum::response::{IntoResponse, Response};
use futures_util::future::{self, BoxFuture, FutureExt};
use http_body_util::LengthLimitError;
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::auth::{Claims, ClaimsExt};
use crate::errors::{GatewayError, TransportError};
use crate::http::request::{CorrelationId, RequestContext, RequestContextExt, X_REQUEST_ID};
use crate::http::response::{inject_proxy_headers, ResponseGuard, GATEWAY_ID, X_FORWARDED_BY};
use crate::observability::metrics;
use crate::resilience::timeouts::within;
use crate::resilience::{RetryError, RetryPolicy};
use crate::routing::{Upstream, UpstreamKind, UpstreamRouter};

/// Result of a single dispatch.
pub type TransportFuture = BoxFuture<'static, Result<Response<Body>, TransportError>>;

/// One-shot dispatch of a request to an upstream.
///
/// Implementations report only failures that produced no HTTP response;
/// any received status is `Ok`.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, upstream: &Upstream, request: Request<Body>) -> TransportFuture;
}

/// hyper-util client per upstream, each with its own connect timeout.
pub struct HyperTransport {
    clients: HashMap<UpstreamKind, Client<HttpConnector, Body>>,
}

impl HyperTransport {
    pub fn new(router: &UpstreamRouter) -> Self {
        let clients = router
            .upstreams()
            .iter()
            .map(|upstream| {
                let mut connector = HttpConnector::new();
                connector.set_connect_timeout(Some(upstream.connect_timeout));
                connector.set_nodelay(true);
                let client = Client::builder(TokioExecutor::new()).build(connector);
                (upstream.kind, client)
            })
            .collect();

        Self { clients }
    }
}

impl Transport for HyperTransport {
    fn send(&self, upstream: &Upstream, request: Request<Body>) -> TransportFuture {
        let Some(client) = self.clients.get(&upstream.kind).cloned() else {
            let missing = TransportError::Request(format!("no client for {}", upstream.kind));
            return future::ready(Err(missing)).boxed();
        };
        let limit = upstream.response_timeout;

        async move {
            let response: Response<Incoming> = within(limit, client.request(request)).await?;
            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(body)))
        }
        .boxed()
    }
}

/// Attempt number attached to each outbound request (0 = initial dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt(pub u32);

/// The buffered inbound call, replayed once per attempt.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub correlation_id: CorrelationId,
    pub claims: Option<Claims>,
}

impl ForwardRequest {
    /// Build the outbound request for one attempt.
    ///
    /// Every part is already typed, so this cannot fail.
    pub fn to_request(&self, attempt: u32) -> Request<Body> {
        let mut request = Request::new(Body::from(self.body.clone()));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.headers_mut() = self.headers.clone();
        request.extensions_mut().insert(Attempt(attempt));
        if let Some(claims) = &self.claims {
            request.extensions_mut().insert(claims.clone());
        }
        request
    }
}

/// Headers that describe one connection and must not be forwarded.
pub fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
            | "host"
    )
}

/// Inbound headers minus hop-by-hop ones, plus the correlation and forwarding markers.
///
/// `Host` is dropped so the client fills in the upstream authority.
pub fn outbound_headers(inbound: &HeaderMap, correlation_id: &CorrelationId) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 2);
    for (name, value) in inbound {
        if !is_hop_by_hop_header(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        headers.insert(X_REQUEST_ID, value);
    }
    headers.insert(X_FORWARDED_BY, HeaderValue::from_static(GATEWAY_ID));
    headers
}

/// Whether a body read failed because it hit the buffering limit.
fn exceeds_length_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let names: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_hop_by_hop_header(name.as_str()))
        .cloned()
        .collect();
    for name in names {
        headers.remove(&name);
    }
}

/// Closes the finalization guard if the handler is dropped before the
/// ladder delivers, so a late result is discarded.
struct PendingResponse {
    guard: ResponseGuard,
    correlation_id: CorrelationId,
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        if self.guard.try_finalize() {
            tracing::debug!(
                request_id = %self.correlation_id,
                "Caller went away before the upstream answered"
            );
        }
    }
}

/// Shared forwarding algorithm for every upstream.
pub struct Forwarder {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    max_body_size: usize,
}

impl Forwarder {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, max_body_size: usize) -> Self {
        Self {
            transport,
            policy,
            max_body_size,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Forward `request` to `upstream`, retrying transport failures.
    pub async fn forward(&self, request: Request<Body>, upstream: Arc<Upstream>) -> Response {
        let context = request
            .context()
            .cloned()
            .unwrap_or_else(|| RequestContext::new(CorrelationId::from_headers(request.headers())));
        let claims = request.claims().cloned();
        let (parts, body) = request.into_parts();

        let body = match axum::body::to_bytes(body, self.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) if exceeds_length_limit(&e) => {
                tracing::warn!(request_id = %context.correlation_id, limit = self.max_body_size, "Request body too large");
                return GatewayError::PayloadTooLarge {
                    limit: self.max_body_size,
                }
                .into_response();
            }
            Err(e) => {
                tracing::warn!(request_id = %context.correlation_id, error = %e, "Request body could not be read");
                return GatewayError::InvalidBody(e.to_string()).into_response();
            }
        };

        let uri = match upstream.target_uri(parts.uri.path(), parts.uri.query()) {
            Ok(uri) => uri,
            Err(e) => return GatewayError::Internal(e.to_string()).into_response(),
        };

        let outbound = ForwardRequest {
            method: parts.method,
            uri,
            headers: outbound_headers(&parts.headers, &context.correlation_id),
            body,
            correlation_id: context.correlation_id.clone(),
            claims,
        };

        let span = tracing::info_span!(
            "gateway.forward",
            request_id = %context.correlation_id,
            upstream = %upstream.kind,
            method = %outbound.method,
            uri = %outbound.uri,
        );

        let (tx, rx) = oneshot::channel();
        let guard = context.guard.clone();
        let transport = self.transport.clone();
        let policy = self.policy;

        tokio::spawn(
            async move {
                let response = run_ladder(transport.as_ref(), policy, &upstream, &outbound).await;
                if guard.try_finalize() {
                    let _ = tx.send(response);
                } else {
                    tracing::debug!("Response already finalized; discarding upstream result");
                }
            }
            .instrument(span),
        );

        let _pending = PendingResponse {
            guard: context.guard,
            correlation_id: context.correlation_id,
        };

        match rx.await {
            Ok(response) => response,
            Err(_) => GatewayError::Internal("forwarding task ended without a response".into())
                .into_response(),
        }
    }
}

async fn run_ladder(
    transport: &dyn Transport,
    policy: RetryPolicy,
    upstream: &Upstream,
    outbound: &ForwardRequest,
) -> Response {
    let start = Instant::now();
    let upstream_name = upstream.kind.as_str();

    let result = policy
        .run(|attempt| {
            if attempt > 0 {
                metrics::record_retry(upstream_name);
            }
            tracing::debug!(attempt, "Dispatching to upstream");
            transport.send(upstream, outbound.to_request(attempt))
        })
        .await;

    match result {
        Ok(mut response) => {
            strip_hop_by_hop(response.headers_mut());
            inject_proxy_headers(&mut response, &outbound.correlation_id);
            metrics::record_request(upstream_name, response.status().as_u16(), start);
            tracing::debug!(status = %response.status(), "Upstream responded");
            response
        }
        Err(RetryError { attempts, last }) => {
            tracing::error!(attempts, error = %last, "Upstream unavailable after retries");
            let error = GatewayError::ServiceUnavailable {
                request_id: outbound.correlation_id.to_string(),
            };
            metrics::record_request(upstream_name, error.status().as_u16(), start);
            error.into_response()
        }
    }
}
