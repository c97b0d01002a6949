//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream URLs, mounts and timeouts
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Detect overlapping upstream mounts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, UpstreamConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstreams.{upstream}.base_url '{url}' is invalid: {reason}")]
    UpstreamUrl {
        upstream: &'static str,
        url: String,
        reason: String,
    },

    #[error("upstreams.{upstream}.{field} '{value}' must start with '/' and not end with '/'")]
    UpstreamPath {
        upstream: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("upstreams.{upstream}.{field} must be greater than zero")]
    ZeroTimeout {
        upstream: &'static str,
        field: &'static str,
    },

    #[error("upstreams.{first} and upstreams.{second} share mount '{mount}'")]
    DuplicateMount {
        first: &'static str,
        second: &'static str,
        mount: String,
    },

    #[error("auth.jwt_secret must not be empty")]
    EmptySecret,

    #[error("cors.origin '{0}' is not a valid header value")]
    CorsOrigin(String),

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a fully deserialized configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let upstreams = [
        ("identity", &config.upstreams.identity),
        ("content", &config.upstreams.content),
        ("commentary", &config.upstreams.commentary),
    ];

    for (name, upstream) in upstreams {
        validate_upstream(name, upstream, &mut errors);
    }

    for (i, &(first, a)) in upstreams.iter().enumerate() {
        for &(second, b) in upstreams.iter().skip(i + 1) {
            if a.mount == b.mount {
                errors.push(ValidationError::DuplicateMount {
                    first,
                    second,
                    mount: a.mount.clone(),
                });
            }
        }
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }

    if config.cors.origin != "*"
        && config
            .cors
            .origin
            .split(',')
            .any(|o| HeaderValue::from_str(o.trim()).is_err() || o.trim().is_empty())
    {
        errors.push(ValidationError::CorsOrigin(config.cors.origin.clone()));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream(name: &'static str, upstream: &UpstreamConfig, errors: &mut Vec<ValidationError>) {
    match Url::parse(&upstream.base_url) {
        Ok(url) if url.scheme() != "http" => errors.push(ValidationError::UpstreamUrl {
            upstream: name,
            url: upstream.base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Ok(url) if url.host_str().is_none() => errors.push(ValidationError::UpstreamUrl {
            upstream: name,
            url: upstream.base_url.clone(),
            reason: "missing host".to_string(),
        }),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::UpstreamUrl {
            upstream: name,
            url: upstream.base_url.clone(),
            reason: e.to_string(),
        }),
    }

    for (field, value) in [("mount", &upstream.mount), ("rewrite_to", &upstream.rewrite_to)] {
        let valid = value.starts_with('/') && (value.len() == 1 || !value.ends_with('/'));
        // An empty rewrite target strips the mount entirely.
        let allowed_empty = field == "rewrite_to" && value.is_empty();
        if !valid && !allowed_empty {
            errors.push(ValidationError::UpstreamPath {
                upstream: name,
                field,
                value: value.clone(),
            });
        }
    }

    if upstream.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout {
            upstream: name,
            field: "connect_timeout_ms",
        });
    }
    if upstream.response_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout {
            upstream: name,
            field: "response_timeout_ms",
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstreams.content.base_url = "https://posts.example".into();
        config.upstreams.commentary.mount = "comments/".into();
        config.upstreams.identity.connect_timeout_ms = 0;
        config.auth.jwt_secret.clear();
        config.security.max_body_size = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6, "{errors:?}");
        assert!(errors.contains(&ValidationError::EmptySecret));
        assert!(errors.contains(&ValidationError::ZeroBodyLimit));
        assert!(errors.contains(&ValidationError::ZeroTimeout {
            upstream: "identity",
            field: "connect_timeout_ms",
        }));
    }

    #[test]
    fn test_duplicate_mounts_rejected() {
        let mut config = GatewayConfig::default();
        config.upstreams.commentary.mount = "/posts".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateMount {
                first: "content",
                second: "commentary",
                mount: "/posts".into(),
            }]
        );
    }

    #[test]
    fn test_empty_rewrite_target_allowed() {
        let mut config = GatewayConfig::default();
        config.upstreams.identity.rewrite_to = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
