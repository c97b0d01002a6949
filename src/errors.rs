//! Gateway error types.
//!
//! Every gateway-originated failure is rendered through the JSON envelope in
//! [`crate::http::response`]. Messages shown to callers are fixed strings;
//! causes are only logged.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::TokenError;
use crate::http::response::Envelope;

/// Failures resolved by the gateway itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No upstream owns the path.
    #[error("Route not found")]
    RouteNotFound,

    /// Protected route called without a bearer token.
    #[error("Access token is required")]
    TokenRequired,

    /// Protected route called with a token that did not verify.
    #[error("credential rejected: {0}")]
    Credential(#[from] TokenError),

    /// Every forwarding attempt failed at the transport level.
    #[error("upstream unavailable after retries (request {request_id})")]
    ServiceUnavailable { request_id: String },

    /// Request body exceeded the buffering limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Request body could not be read (e.g. the client aborted mid-upload).
    #[error("request body unreadable: {0}")]
    InvalidBody(String),

    /// Anything else. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound => StatusCode::NOT_FOUND,
            GatewayError::TokenRequired => StatusCode::UNAUTHORIZED,
            GatewayError::Credential(TokenError::VerificationFailed) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::Credential(_) => StatusCode::UNAUTHORIZED,
            GatewayError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::RouteNotFound => "Route not found",
            GatewayError::TokenRequired => "Access token is required",
            GatewayError::Credential(TokenError::Expired) => "Token expired",
            GatewayError::Credential(TokenError::Malformed) => "Invalid token",
            GatewayError::Credential(TokenError::VerificationFailed) => {
                "Authentication service error"
            }
            GatewayError::ServiceUnavailable { .. } => "Service temporarily unavailable",
            GatewayError::PayloadTooLarge { .. } => "Request body too large",
            GatewayError::InvalidBody(_) => "Invalid request body",
            GatewayError::Internal(_) => "Internal server error",
        }
    }

    fn envelope(&self) -> Envelope {
        match self {
            GatewayError::RouteNotFound => Envelope::route_not_found(),
            GatewayError::ServiceUnavailable { request_id } => {
                Envelope::service_unavailable(request_id)
            }
            other => Envelope::failure(other.public_message()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Gateway error");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }
        self.envelope().into_response_with(status)
    }
}

/// A forwarding attempt that never produced an HTTP response.
///
/// These are the only failures the retry ladder acts on.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<hyper_util::client::legacy::Error> for TransportError {
    fn from(e: hyper_util::client::legacy::Error) -> Self {
        if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_statuses() {
        assert_eq!(
            GatewayError::Credential(TokenError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::Credential(TokenError::Malformed).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::Credential(TokenError::VerificationFailed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = GatewayError::Internal("pool exhausted at 0x7f".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_token_required_message() {
        assert_eq!(
            GatewayError::TokenRequired.public_message(),
            "Access token is required"
        );
    }
}
