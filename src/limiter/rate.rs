//! Throughput-based limiter.

use tracing::debug;

use super::{LimitLatch, Limiter};
use crate::config::ValveConfig;
use crate::error::{Result, ValveError};

/// The rule a [`RateLimiter`] applies, e.g. a token bucket or sliding window.
pub trait RatePolicy {
    /// Whether the policy's threshold is exceeded for the given target
    /// throughput in bytes per second.
    fn is_exceeded(&self, throughput: Option<f64>) -> Result<bool> {
        let _ = throughput;
        Err(ValveError::NotImplemented("is_exceeded"))
    }
}

/// Placeholder policy: no rule is enforced, so every check reports
/// [`ValveError::NotImplemented`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Unenforced;

impl RatePolicy for Unenforced {}

/// A limiter named `"RateLimiter"` whose rule is supplied by a [`RatePolicy`].
///
/// Whenever the policy reports the threshold exceeded the limiter latches,
/// so [`is_rate_limited`](Limiter::is_rate_limited) stays true until
/// [`LimitLatch::reset`] is called.
#[derive(Debug, Default)]
pub struct RateLimiter<P = Unenforced> {
    /// Rule deciding when the limit is exceeded
    policy: P,
    /// Target throughput in bytes per second
    throughput: Option<f64>,
    latch: LimitLatch,
}

impl RateLimiter<Unenforced> {
    /// Create a limiter with no policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a limiter with no policy, targeting the valve's throughput.
    pub fn for_config(config: &ValveConfig) -> Self {
        Self::with_policy(Unenforced, config.throughput)
    }
}

impl<P: RatePolicy> RateLimiter<P> {
    /// Create a limiter applying `policy` against `throughput`.
    pub fn with_policy(policy: P, throughput: Option<f64>) -> Self {
        Self {
            policy,
            throughput,
            latch: LimitLatch::new(),
        }
    }

    pub fn throughput(&self) -> Option<f64> {
        self.throughput
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}

impl<P: RatePolicy> Limiter for RateLimiter<P> {
    fn name(&self) -> &str {
        "RateLimiter"
    }

    fn is_exceeded(&self) -> Result<bool> {
        let exceeded = self.policy.is_exceeded(self.throughput)?;
        if exceeded {
            debug!(throughput = ?self.throughput, "Rate limit exceeded");
            self.latch.latch();
        }
        Ok(exceeded)
    }

    fn latch(&self) -> &LimitLatch {
        &self.latch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Reports exceeded on every `n`th check.
    struct EveryNth {
        n: u32,
        calls: Cell<u32>,
    }

    impl RatePolicy for EveryNth {
        fn is_exceeded(&self, _throughput: Option<f64>) -> Result<bool> {
            let calls = self.calls.get() + 1;
            self.calls.set(calls);
            Ok(calls % self.n == 0)
        }
    }

    #[test]
    fn test_rate_limiter_name() {
        let limiter = RateLimiter::new();
        assert_eq!(limiter.name(), "RateLimiter");
    }

    #[test]
    fn test_unenforced_is_not_implemented() {
        let limiter = RateLimiter::new();
        assert!(matches!(
            limiter.is_exceeded(),
            Err(ValveError::NotImplemented("is_exceeded"))
        ));
        assert!(!limiter.is_limited());
    }

    #[test]
    fn test_for_config_carries_throughput() {
        let config = ValveConfig::default().with_throughput(2048.0);
        let limiter = RateLimiter::for_config(&config);
        assert_eq!(limiter.throughput(), Some(2048.0));
    }

    #[test]
    fn test_policy_trips_latch() {
        let limiter = RateLimiter::with_policy(
            EveryNth {
                n: 2,
                calls: Cell::new(0),
            },
            Some(1024.0),
        );

        assert!(!limiter.is_exceeded().unwrap());
        assert!(!limiter.is_rate_limited());

        assert!(limiter.is_exceeded().unwrap());
        assert!(limiter.is_rate_limited());

        // Live check recovers, the latch does not.
        assert!(!limiter.is_exceeded().unwrap());
        assert!(limiter.is_limited());

        limiter.latch().reset();
        assert!(!limiter.is_limited());
    }
}
