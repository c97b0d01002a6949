//! Edge API gateway library.
//!
//! Fronts the identity, content and commentary services: classifies each
//! request, enforces bearer authentication where required, and forwards with
//! bounded, correlated retries.

pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use errors::{GatewayError, TransportError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
