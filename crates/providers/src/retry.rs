//! Exponential backoff with optional jitter.

use rand::Rng;
use shared::settings::RetryPolicy;
use std::time::Duration;

/// Backoff before retrying after the zero-based `attempt` failed:
/// `min(max_delay, base_delay * multiplier^attempt)`.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponent = attempt.min(i32::MAX as u32) as i32;
    let raw = policy.base_delay_ms as f64 * policy.backoff_multiplier.powi(exponent);
    let cap = policy.max_delay_ms as f64;
    let millis = if raw.is_finite() { raw.clamp(0.0, cap) } else { cap };
    Duration::from_millis(millis as u64)
}

/// [`backoff_delay`] scaled by a uniform factor in `[0.5, 1.0]` when the
/// policy asks for jitter. Never exceeds `max_delay`.
pub fn retry_delay<R: Rng + ?Sized>(policy: &RetryPolicy, attempt: u32, rng: &mut R) -> Duration {
    let delay = backoff_delay(policy, attempt);
    if !policy.jitter {
        return delay;
    }
    let factor: f64 = rng.gen_range(0.5..=1.0);
    delay.mul_f64(factor)
}
