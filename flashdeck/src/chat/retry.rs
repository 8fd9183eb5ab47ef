//! Retry classification and backoff timing.

use std::time::Duration;

use rand::prelude::RngExt;
use rand::rng;

/// Upper bound on any single backoff delay
pub const MAX_BACKOFF_MS: f64 = 2000.0;

/// Jitter is drawn uniformly from `[0, MAX_JITTER_MS)`
pub const MAX_JITTER_MS: f64 = 100.0;

/// 429 and every 5xx are worth another attempt; everything else is final
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Delay before retrying after attempt `attempt` (0-indexed) failed.
///
/// `min(2000ms, min_retry_delay * 2^attempt + jitter)`
pub fn backoff_delay(min_retry_delay: Duration, attempt: u32) -> Duration {
    let jitter_ms = rng().random_range(0.0..MAX_JITTER_MS);
    backoff_delay_with_jitter(min_retry_delay, attempt, jitter_ms)
}

fn backoff_delay_with_jitter(min_retry_delay: Duration, attempt: u32, jitter_ms: f64) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base_ms = min_retry_delay.as_millis() as f64 * 2f64.powi(exponent);
    let delay_ms = (base_ms + jitter_ms).min(MAX_BACKOFF_MS);
    // Truncate to whole microseconds so the jitter never rounds up past its bound
    Duration::from_micros((delay_ms * 1000.0) as u64)
}
