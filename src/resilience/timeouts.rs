//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a deadline
//! - Turn elapsed deadlines and client errors into transport failures
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - A timed-out attempt is retryable like any other transport failure

use std::future::Future;
use std::time::Duration;

use crate::errors::TransportError;

/// Await `fut`, failing with [`TransportError::Timeout`] after `limit`.
pub async fn within<T, E, F>(limit: Duration, fut: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<TransportError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(TransportError::Timeout(limit)),
    }
}
