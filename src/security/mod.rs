//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (answer preflight / OPTIONS, attach CORS headers)
//!     → Pass to routing
//! Outgoing response:
//!     → headers.rs (fixed hardening headers on every response)
//! ```
//!
//! # Design Decisions
//! - Header values are fixed at startup; nothing is computed per request
//! - CORS origins come from configuration, never from the request, except
//!   when `*` is combined with credentials (the caller's origin is mirrored)

pub mod cors;
pub mod headers;

pub use cors::{answer_options, cors_layer};
pub use headers::security_headers;
