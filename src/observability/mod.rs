//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, per-request spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID is a field on every forwarding span
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is installed
//! - `RUST_LOG` wins over the configured level

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
