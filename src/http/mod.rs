//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (correlation id, per-request context)
//!     → [routing decides upstream, auth gate decides access]
//!     → proxy.rs (buffer, rewrite, retry ladder)
//!     → response.rs (envelope or proxied response + headers)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use proxy::{Forwarder, HyperTransport, Transport, TransportFuture};
pub use request::{CorrelationId, RequestContext, RequestContextExt, X_REQUEST_ID};
pub use response::{Envelope, ResponseGuard};
pub use server::{AppState, HttpServer};
