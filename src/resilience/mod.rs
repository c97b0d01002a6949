//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (bound the wait for response headers)
//!     → On transport failure: retries.rs (sequential ladder)
//!     → backoff.rs (base × n before retry n)
//! ```
//!
//! # Design Decisions
//! - Only transport failures are retried; any HTTP status is a final answer
//! - Every outbound call has a deadline
//! - The ladder is bounded; exhaustion surfaces as 503 upstream of here

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{RetryError, RetryPolicy};
