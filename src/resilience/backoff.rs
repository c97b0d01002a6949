//! Linear backoff.

use std::time::Duration;

/// Delay before retry number `retry` (1-based): `base × retry`.
///
/// Retry 0 is the initial dispatch and never waits.
pub fn linear_backoff(retry: u32, base: Duration) -> Duration {
    base.saturating_mul(retry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let base = Duration::from_millis(1000);
        assert_eq!(linear_backoff(0, base), Duration::ZERO);
        assert_eq!(linear_backoff(1, base), Duration::from_millis(1000));
        assert_eq!(linear_backoff(2, base), Duration::from_millis(2000));
        assert_eq!(linear_backoff(3, base), Duration::from_millis(3000));
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(linear_backoff(u32::MAX, Duration::MAX), Duration::MAX);
    }
}
