//! Per-request authentication decision.
//!
//! Combines the route classifier and the token verifier:
//!
//! | classification      | no token        | bad token           | good token    |
//! |---------------------|-----------------|---------------------|---------------|
//! | protected           | 401             | 401 (500 if verify) | claims        |
//! | public / unlisted   | continue        | continue, logged    | claims        |
//!
//! Only the protected branch fails closed.

use axum::http::{header::AUTHORIZATION, HeaderMap, Method};
use tracing::instrument;

use crate::auth::claims::Claims;
use crate::auth::token::{extract_token, JwtVerifier};
use crate::errors::GatewayError;
use crate::observability::metrics;
use crate::routing::{Classification, RouteTable};

/// Classifier + verifier, constructed once at startup.
#[derive(Debug)]
pub struct AuthGate {
    table: RouteTable,
    verifier: JwtVerifier,
}

impl AuthGate {
    pub fn new(table: RouteTable, verifier: JwtVerifier) -> Self {
        Self { table, verifier }
    }

    pub fn classify(&self, method: &Method, path: &str) -> Classification {
        self.table.classify(method, path)
    }

    /// Decide whether the request may proceed.
    ///
    /// Returns the verified claims when a valid token was presented, `None`
    /// when the request proceeds unauthenticated, or the rejection.
    #[instrument(skip_all, name = "gateway.auth.gate", fields(method = %method, path = %path))]
    pub fn authorize(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Option<Claims>, GatewayError> {
        let classification = self.classify(method, path);
        let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let token = extract_token(header);

        match (classification.requires_token(), token) {
            (true, None) => {
                tracing::warn!(target: "gateway.auth", %classification, "Access token missing");
                metrics::record_auth_rejection("token_required");
                Err(GatewayError::TokenRequired)
            }
            (true, Some(token)) => match self.verifier.verify(token) {
                Ok(claims) => Ok(Some(claims)),
                Err(e) => {
                    tracing::warn!(target: "gateway.auth", %classification, reason = e.as_str(), "Access token rejected");
                    metrics::record_auth_rejection(e.as_str());
                    Err(GatewayError::Credential(e))
                }
            },
            (false, None) => Ok(None),
            (false, Some(token)) => match self.verifier.verify(token) {
                Ok(claims) => Ok(Some(claims)),
                Err(e) => {
                    tracing::warn!(target: "gateway.auth", %classification, reason = e.as_str(), "Optional authentication failed");
                    Ok(None)
                }
            },
        }
    }
}

/// Extension trait for extracting claims from a request.
pub trait ClaimsExt {
    /// The verified claims, if the gate attached any.
    fn claims(&self) -> Option<&Claims>;
}

impl<B> ClaimsExt for axum::http::Request<B> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }
}
