//! The closed set of limiting strategies behind one interface.

use std::sync::Arc;

use super::backend::RateAlgorithm;
use super::caller::CallerId;
use super::clock::Clock;
use super::fixed_window::FixedWindowLimiter;
use super::rules::{AlgorithmKind, Quota};
use super::sliding_window::SlidingWindowLimiter;
use super::token_bucket::TokenBucketLimiter;

/// A limiter of one of the supported kinds, chosen at construction time.
pub enum Limiter {
    TokenBucket(TokenBucketLimiter),
    FixedWindow(FixedWindowLimiter),
    SlidingWindow(SlidingWindowLimiter),
}

impl Limiter {
    /// Build a limiter of the given kind.
    pub fn build(kind: AlgorithmKind, quota: Quota, clock: Arc<dyn Clock>) -> Self {
        match kind {
            AlgorithmKind::TokenBucket => Limiter::TokenBucket(TokenBucketLimiter::new(quota, clock)),
            AlgorithmKind::FixedWindow => Limiter::FixedWindow(FixedWindowLimiter::new(quota, clock)),
            AlgorithmKind::SlidingWindow => {
                Limiter::SlidingWindow(SlidingWindowLimiter::new(quota, clock))
            }
        }
    }

    fn inner(&self) -> &dyn RateAlgorithm {
        match self {
            Limiter::TokenBucket(limiter) => limiter,
            Limiter::FixedWindow(limiter) => limiter,
            Limiter::SlidingWindow(limiter) => limiter,
        }
    }
}

impl RateAlgorithm for Limiter {
    fn try_acquire(&self, caller: &CallerId) -> bool {
        self.inner().try_acquire(caller)
    }

    fn quota(&self) -> Quota {
        self.inner().quota()
    }

    fn kind(&self) -> AlgorithmKind {
        self.inner().kind()
    }

    fn tracked_callers(&self) -> usize {
        self.inner().tracked_callers()
    }

    fn forget(&self, caller: &CallerId) -> bool {
        self.inner().forget(caller)
    }
}

impl std::fmt::Debug for Limiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Limiter")
            .field("kind", &self.kind())
            .field("quota", &self.quota())
            .field("tracked_callers", &self.tracked_callers())
            .finish()
    }
}
