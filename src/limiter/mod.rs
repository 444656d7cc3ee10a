//! Rate limiter extension points.
//!
//! A [`Limiter`] decides whether a threshold is exceeded. Valves observe
//! throughput; enforcing it is left to limiter policies plugged in here.

mod rate;

pub use rate::{RateLimiter, RatePolicy, Unenforced};

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, ValveError};

/// A pluggable predicate for deciding whether to throttle.
pub trait Limiter {
    /// Stable name identifying the limiter variant.
    fn name(&self) -> &str;

    /// Whether the threshold is exceeded right now.
    fn is_exceeded(&self) -> Result<bool> {
        Err(ValveError::NotImplemented("is_exceeded"))
    }

    /// The sticky flag recording that this limiter has tripped.
    fn latch(&self) -> &LimitLatch;

    /// Whether the limiter has tripped since its latch was last reset.
    fn is_rate_limited(&self) -> bool {
        self.latch().is_latched()
    }

    /// Alias for [`is_rate_limited`](Limiter::is_rate_limited).
    fn is_limited(&self) -> bool {
        self.is_rate_limited()
    }
}

/// A flag that stays set once tripped, until explicitly reset.
#[derive(Debug, Default)]
pub struct LimitLatch {
    tripped: AtomicBool,
}

impl LimitLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag.
    pub fn latch(&self) {
        self.tripped.store(true, Ordering::SeqCst);
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.tripped.store(false, Ordering::SeqCst);
    }

    pub fn is_latched(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}
