//! Retry backoff shared by the HTTP engines.

use std::time::Duration;

/// Longest single wait between retries.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential backoff: 1s, 2s, 4s, ... capped at [`MAX_BACKOFF`].
pub fn backoff_delay(retry_count: u32) -> Duration {
    let secs = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}
