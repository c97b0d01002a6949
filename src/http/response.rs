//! Response handling and transformation.
//!
//! # Responsibilities
//! - Render gateway-originated outcomes in the fixed JSON envelope
//! - Add proxy headers (x-request-id, x-proxied-by) to upstream responses
//! - Guard against writing more than one terminal response per request
//!
//! # Design Decisions
//! - Upstream bodies are streamed through untouched
//! - Envelope extras are flattened next to `success` and `message`
//! - The finalization guard is a single atomic flag shared by every write path

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::http::request::{CorrelationId, X_REQUEST_ID};

/// Marker value identifying this gateway on forwarded traffic.
pub const GATEWAY_ID: &str = "api-gateway";

/// Added to every proxied response.
pub const X_PROXIED_BY: HeaderName = HeaderName::from_static("x-proxied-by");

/// Added to every outbound upstream request.
pub const X_FORWARDED_BY: HeaderName = HeaderName::from_static("x-forwarded-by");

/// Routes advertised on a 404.
pub const AVAILABLE_ROUTES: [&str; 3] = ["/auth/*", "/posts/*", "/comments/*"];

/// `{success, message, ...extra}`.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra top-level field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn route_not_found() -> Self {
        Self::failure("Route not found").with("availableRoutes", AVAILABLE_ROUTES.to_vec())
    }

    pub fn service_unavailable(request_id: &str) -> Self {
        Self::failure("Service temporarily unavailable")
            .with("requestId", request_id)
            .with("error", "SERVICE_UNAVAILABLE")
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Stamp a proxied response with the correlation id and proxy marker.
pub fn inject_proxy_headers(response: &mut Response, request_id: &CorrelationId) {
    let headers = response.headers_mut();
    headers.insert(X_PROXIED_BY, HeaderValue::from_static(GATEWAY_ID));
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        headers.insert(X_REQUEST_ID, value);
    }
}

/// Ensures exactly one terminal response per logical request.
///
/// Cloned handles share one flag. The first `try_finalize` wins; every later
/// writer must discard its response.
#[derive(Debug, Clone, Default)]
pub struct ResponseGuard {
    finalized: Arc<AtomicBool>,
}

impl ResponseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to write the response. Returns false if already claimed.
    pub fn try_finalize(&self) -> bool {
        self.finalized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }
}
