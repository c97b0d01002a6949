//! Cross-origin resource sharing.
//!
//! # Responsibilities
//! - Build the CORS layer from configuration
//! - Answer every `OPTIONS` request with an empty 200
//!
//! # Design Decisions
//! - `*` with credentials mirrors the caller's origin; browsers reject a
//!   literal `*` on credentialed requests
//! - Allowed methods and headers are fixed

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// CORS layer for the configured origin policy.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allow_origin(config))
        .allow_credentials(config.credentials)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, X_REQUESTED_WITH])
}

fn allow_origin(config: &CorsConfig) -> AllowOrigin {
    if config.origin.trim() == "*" {
        return if config.credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        };
    }

    let origins: Vec<HeaderValue> = config
        .origin
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = o, "Ignoring unusable CORS origin");
                None
            }
        })
        .collect();
    AllowOrigin::list(origins)
}

/// Middleware: short-circuit `OPTIONS` with an empty 200.
///
/// Sits inside the CORS layer so the answer still carries CORS headers.
pub async fn answer_options(request: Request<Body>, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::any;
    use axum::Router;
    use tower::ServiceExt;

    fn app(config: &CorsConfig) -> Router {
        Router::new()
            .route("/{*path}", any(|| async { "reached" }))
            .layer(axum::middleware::from_fn(answer_options))
            .layer(cors_layer(config))
    }

    #[tokio::test]
    async fn test_wildcard_with_credentials_mirrors_origin() {
        let response = app(&CorsConfig::default())
            .oneshot(
                Request::builder()
                    .uri("/posts")
                    .header("origin", "https://app.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "https://app.example.com");
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }

    #[tokio::test]
    async fn test_any_options_request_is_empty_200() {
        let response = app(&CorsConfig::default())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/comments/7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_preflight_lists_methods() {
        let response = app(&CorsConfig::default())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/posts")
                    .header("origin", "https://app.example.com")
                    .header("access-control-request-method", "DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let methods = response.headers()["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("DELETE"));
    }

    #[tokio::test]
    async fn test_explicit_origin_list() {
        let config = CorsConfig {
            origin: "https://a.example, https://b.example".into(),
            credentials: true,
        };

        let allowed = app(&config)
            .oneshot(
                Request::builder()
                    .uri("/posts")
                    .header("origin", "https://b.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.headers()["access-control-allow-origin"], "https://b.example");

        let denied = app(&config)
            .oneshot(
                Request::builder()
                    .uri("/posts")
                    .header("origin", "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }
}
