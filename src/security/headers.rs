//! Security response headers.
//!
//! Applied to every response, gateway-originated or proxied, overriding any
//! value an upstream may have set.

use axum::http::{HeaderName, HeaderValue};

pub const X_CONTENT_TYPE_OPTIONS: HeaderName = HeaderName::from_static("x-content-type-options");
pub const X_FRAME_OPTIONS: HeaderName = HeaderName::from_static("x-frame-options");
pub const X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");
pub const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// The fixed hardening headers, in application order.
pub fn security_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        (X_POWERED_BY, HeaderValue::from_static("API-Gateway")),
    ]
}
