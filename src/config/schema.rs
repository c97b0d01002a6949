//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a local-development default.

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The three upstream services.
    pub upstreams: UpstreamsConfig,

    /// Bearer token verification.
    pub auth: AuthConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Per-upstream settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Base URL of the service (e.g., "http://localhost:3001").
    pub base_url: String,

    /// Inbound path prefix this upstream is mounted under.
    pub mount: String,

    /// Replacement for `mount` when rewriting the outbound path.
    pub rewrite_to: String,

    /// Connection establishment timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Time allowed for the upstream to produce a response head, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub response_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl UpstreamConfig {
    fn local(port: u16, mount: &str) -> Self {
        Self {
            base_url: format!("http://localhost:{port}"),
            mount: mount.to_string(),
            rewrite_to: mount.to_string(),
            connect_timeout_ms: default_timeout_ms(),
            response_timeout_ms: default_timeout_ms(),
        }
    }
}

/// Fields of an `[upstreams.<kind>]` table as written; anything left out
/// falls back to that kind's default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpstreamOverrides {
    base_url: Option<String>,
    mount: Option<String>,
    rewrite_to: Option<String>,
    connect_timeout_ms: Option<u64>,
    response_timeout_ms: Option<u64>,
}

impl UpstreamOverrides {
    fn apply(self, base: UpstreamConfig) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.base_url.unwrap_or(base.base_url),
            mount: self.mount.unwrap_or(base.mount),
            rewrite_to: self.rewrite_to.unwrap_or(base.rewrite_to),
            connect_timeout_ms: self.connect_timeout_ms.unwrap_or(base.connect_timeout_ms),
            response_timeout_ms: self.response_timeout_ms.unwrap_or(base.response_timeout_ms),
        }
    }
}

/// The identity, content and commentary services.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamsConfig {
    pub identity: UpstreamConfig,
    pub content: UpstreamConfig,
    pub commentary: UpstreamConfig,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            identity: UpstreamConfig::local(3001, "/auth"),
            content: UpstreamConfig::local(3002, "/posts"),
            commentary: UpstreamConfig::local(3003, "/comments"),
        }
    }
}

impl<'de> Deserialize<'de> for UpstreamsConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Default, Deserialize)]
        #[serde(default)]
        struct Tables {
            identity: UpstreamOverrides,
            content: UpstreamOverrides,
            commentary: UpstreamOverrides,
        }

        let tables = Tables::deserialize(deserializer)?;
        let defaults = Self::default();
        Ok(Self {
            identity: tables.identity.apply(defaults.identity),
            content: tables.content.apply(defaults.content),
            commentary: tables.commentary.apply(defaults.commentary),
        })
    }
}

/// Token verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HS256 signing secret.
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            jwt_secret: "your-super-secret-jwt-key-change-this-in-production".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origin. `*` or a comma-separated list of origins.
    pub origin: String,

    /// Whether credentialed requests are allowed.
    pub credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: "*".to_string(),
            credentials: true,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries allowed after the initial dispatch.
    pub max_attempts: u32,

    /// Base delay for linear backoff in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
