//! Bearer token verification.
//!
//! Verifies HS256 tokens minted by the identity service with the shared
//! signing secret.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only HS256 is accepted
//! - `exp` is enforced with no clock leeway when present
//! - Failure kinds are coarse; causes are logged at debug only

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;
use tracing::instrument;

use crate::auth::claims::Claims;

/// Tokens larger than this are rejected without parsing.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Malformed,

    #[error("Token verification failed")]
    VerificationFailed,
}

impl TokenError {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenError::Expired => "expired",
            TokenError::Malformed => "malformed",
            TokenError::VerificationFailed => "verification_failed",
        }
    }
}

impl From<&ErrorKind> for TokenError {
    fn from(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::MissingAlgorithm
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::VerificationFailed,
        }
    }
}

/// HS256 verifier bound to one signing secret.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier for tokens signed with `secret`.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        // Tokens without `exp` are accepted; tokens with one must be unexpired.
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and expiry, returning the claims.
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(target: "gateway.auth", size = token.len(), "Token exceeds size limit");
            return Err(TokenError::Malformed);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(target: "gateway.auth", error = %e, "Token verification failed");
                TokenError::from(e.kind())
            })
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

/// Read the claims WITHOUT checking the signature or expiry.
///
/// For inspection and diagnostics only. Never use the result to authorize a request.
pub fn decode_unverified(token: &str) -> Option<Claims> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        return None;
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

/// Extract the token from an `Authorization` header value.
///
/// Only `Bearer <token>` (exactly two space-separated fields) is accepted.
/// Any other shape yields `None`.
pub fn extract_token(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || scheme != "Bearer" || token.is_empty() {
        return None;
    }
    Some(token)
}
