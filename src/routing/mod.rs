//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (which upstream owns this path?)
//!     → classifier.rs (public / protected / unlisted)
//!     → matcher.rs (evaluate path conditions)
//!     → Return: matched Upstream + Classification, or NoMatch
//!
//! Compilation (at startup):
//!     UpstreamsConfig → UpstreamRouter
//!     RoutePattern[]  → RouteTable
//!     → Freeze as immutable tables shared via Arc
//! ```
//!
//! # Design Decisions
//! - Tables compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same result

pub mod classifier;
pub mod matcher;
pub mod router;

pub use classifier::{Classification, RoutePattern, RouteTable};
pub use router::{Upstream, UpstreamKind, UpstreamRouter};
