//! Retry policy for source fetches
//!
//! Both sources share the same retry shape: a bounded number of attempts with
//! exponentially growing, capped delays. Throttling responses (HTTP 429/403)
//! use a higher cap than plain network failures. Jitter is added at sleep
//! time so the deterministic delay curve stays testable.

use rand::Rng;
use std::time::Duration;

/// Bounded exponential backoff policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts before the fetch degrades to absent
    pub max_attempts: u32,

    /// Delay ceiling after a throttling response (429/403)
    pub throttle_cap: Duration,

    /// Delay ceiling after a transient network failure
    pub network_cap: Duration,

    /// Upper bound of the random extra delay added to every backoff sleep
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            throttle_cap: Duration::from_secs(60),
            network_cap: Duration::from_secs(30),
            jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy with near-zero delays, for exercising retry paths in tests
    pub fn fast() -> Self {
        Self {
            max_attempts: 6,
            throttle_cap: Duration::from_millis(8),
            network_cap: Duration::from_millis(4),
            jitter: Duration::from_millis(1),
        }
    }

    /// Delay before retrying after a throttling response
    ///
    /// Doubles per attempt (1s, 2s, 4s, ...) and is capped at `throttle_cap`.
    pub fn throttle_delay(&self, attempt: u32) -> Duration {
        capped_pow2(attempt, self.throttle_cap)
    }

    /// Delay before retrying after a transient network failure
    pub fn network_delay(&self, attempt: u32) -> Duration {
        capped_pow2(attempt, self.network_cap)
    }

    /// Adds the random jitter component to a computed delay
    pub fn with_jitter(&self, base: Duration) -> Duration {
        jittered(base, self.jitter)
    }
}

/// `base` plus a uniformly random extra in `0..=jitter`
pub fn jittered(base: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return base;
    }
    let extra = rand::thread_rng().gen_range(0..=jitter.as_millis() as u64);
    base + Duration::from_millis(extra)
}

/// `min(cap, 2^attempt seconds)`, saturating on large attempt numbers
fn capped_pow2(attempt: u32, cap: Duration) -> Duration {
    let exp = attempt.min(32);
    let secs = 1u64 << exp;
    Duration::from_secs(secs).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_are_monotonic_up_to_cap() {
        let policy = RetryPolicy::default();
        let mut last = Duration::ZERO;
        for attempt in 0..policy.max_attempts {
            let delay = policy.throttle_delay(attempt);
            assert!(delay >= last, "attempt {} shrank the delay", attempt);
            last = delay;
        }
    }

    #[test]
    fn test_throttle_delay_is_capped() {
        let policy = RetryPolicy::default();
        for attempt in 0..64 {
            assert!(policy.throttle_delay(attempt) <= policy.throttle_cap);
        }
        // Large attempt numbers must not overflow
        assert_eq!(policy.throttle_delay(u32::MAX), policy.throttle_cap);
    }

    #[test]
    fn test_network_cap_is_lower_than_throttle_cap() {
        let policy = RetryPolicy::default();
        assert!(policy.network_cap < policy.throttle_cap);
        assert_eq!(policy.network_delay(10), policy.network_cap);
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.throttle_delay(0), Duration::from_secs(1));
        assert_eq!(policy.throttle_delay(1), Duration::from_secs(2));
        assert_eq!(policy.throttle_delay(2), Duration::from_secs(4));
        assert_eq!(policy.throttle_delay(5), Duration::from_secs(32));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy {
            jitter: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        let base = Duration::from_secs(1);
        for _ in 0..50 {
            let jittered = policy.with_jitter(base);
            assert!(jittered >= base);
            assert!(jittered <= base + Duration::from_millis(100));
        }
    }

    #[test]
    fn test_zero_jitter_is_identity() {
        let policy = RetryPolicy {
            jitter: Duration::ZERO,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.with_jitter(Duration::from_secs(3)), Duration::from_secs(3));
    }
}
