//! Request handling and transformation.
//!
//! # Responsibilities
//! - Accept the caller's `x-request-id` or generate a correlation id
//! - Attach the per-request context (correlation id + finalization guard)
//! - Echo the correlation id on every response
//!
//! # Design Decisions
//! - Correlation id established as early as possible for tracing
//! - Generated ids are time-derived with a random suffix: `req_<millis>_<9 base36>`
//! - The id never changes for the lifetime of the request, retries included

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use rand::Rng;

use crate::http::response::ResponseGuard;

/// Correlation header, accepted from the caller or generated.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Opaque per-logical-request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
            .collect();
        Self(format!("req_{millis}_{suffix}"))
    }

    /// Take the caller's id when present and usable, otherwise generate one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request state private to one handling chain.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
    pub guard: ResponseGuard,
}

impl RequestContext {
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            guard: ResponseGuard::new(),
        }
    }
}

/// Extension trait for reading the request context.
pub trait RequestContextExt {
    /// The context attached by [`propagate_request_id`], if it ran.
    fn context(&self) -> Option<&RequestContext>;
}

impl<B> RequestContextExt for axum::http::Request<B> {
    fn context(&self) -> Option<&RequestContext> {
        self.extensions().get::<RequestContext>()
    }
}

/// Middleware: establish the correlation id, attach context, echo the id back.
pub async fn propagate_request_id(mut request: Request<Body>, next: Next) -> Response {
    let correlation_id = CorrelationId::from_headers(request.headers());

    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        request.headers_mut().insert(X_REQUEST_ID, value);
    }
    request
        .extensions_mut()
        .insert(RequestContext::new(correlation_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_id_shape() {
        let id = CorrelationId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "req");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| SUFFIX_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<CorrelationId> = (0..1000).map(|_| CorrelationId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_inbound_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("trace-abc-123"));
        assert_eq!(CorrelationId::from_headers(&headers).as_str(), "trace-abc-123");
    }

    #[test]
    fn test_blank_inbound_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("   "));
        assert!(CorrelationId::from_headers(&headers).as_str().starts_with("req_"));
    }
}
