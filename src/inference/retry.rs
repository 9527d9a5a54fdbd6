//! Warm-up retry policy for hosted inference calls.
//!
//! The provider answers 503 while a model is still loading onto a worker.
//! The OCR path retries those responses with a linearly increasing delay;
//! the delay schedule is a pure function of the attempt number so tests can
//! assert it without waiting, and sleeping goes through the [`Sleeper`]
//! trait so tests can record delays instead of serving them.

use std::time::Duration;

use async_trait::async_trait;

/// Attempts allowed against a loading model before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base delay; attempt `n` (1-indexed) waits `n * BASE_DELAY`.
pub const BASE_DELAY: Duration = Duration::from_millis(1500);

/// Delay to wait after the given 1-indexed attempt reported a loading model.
pub fn backoff_delay(attempt: u32) -> Duration {
    BASE_DELAY * attempt
}

/// Injectable sleep dependency.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_linearly_with_attempt() {
        assert_eq!(backoff_delay(1), Duration::from_millis(1500));
        assert_eq!(backoff_delay(2), Duration::from_millis(3000));
        assert_eq!(backoff_delay(3), Duration::from_millis(4500));
    }

    #[test]
    fn worst_case_wait_is_about_nine_seconds() {
        let total: Duration = (1..=MAX_ATTEMPTS).map(backoff_delay).sum();
        assert_eq!(total, Duration::from_millis(9000));
    }
}
