//! Exponential backoff with jitter.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::error::RelayResult;

/// Jitter is up to this fraction of the delay, as a divisor.
const JITTER_DIVISOR: u64 = 10;

/// Delay before retry number `attempt` (1-based): `base_ms * 2^(attempt-1)`
/// capped at `max_ms`, plus up to 10% jitter. Attempt 0 waits nothing.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let Some(exponent) = attempt.checked_sub(1) else {
        return Duration::ZERO;
    };

    let delay = base_ms.saturating_mul(2u64.saturating_pow(exponent)).min(max_ms);
    let jitter = match delay / JITTER_DIVISOR {
        0 => 0,
        range => rand::thread_rng().gen_range(0..range),
    };

    Duration::from_millis(delay + jitter)
}

/// Run `op` up to `max_attempts` times, sleeping between attempts while the
/// error is transient. Permanent errors return immediately.
pub async fn retry_transient<T, F, Fut>(
    max_attempts: u32,
    base_ms: u64,
    max_ms: u64,
    mut op: F,
) -> RelayResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RelayResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = calculate_backoff(attempt, base_ms, max_ms);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
