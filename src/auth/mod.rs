//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → token.rs (extract "Bearer <token>", verify HS256, map failure kind)
//!     → gate.rs (classification decides fail-open vs fail-closed)
//!     → claims.rs (attached to request extensions on success)
//! ```
//!
//! # Design Decisions
//! - Verifier and gate are plain components built from configuration
//! - Unverified decoding exists for inspection tooling only
//! - Rejections never reach the forwarder

pub mod claims;
pub mod gate;
pub mod token;

pub use claims::Claims;
pub use gate::{AuthGate, ClaimsExt};
pub use token::{decode_unverified, extract_token, JwtVerifier, TokenError};
