//! Token bucket limiter.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

use super::backend::RateAlgorithm;
use super::caller::CallerId;
use super::clock::Clock;
use super::rules::{AlgorithmKind, Quota};

/// Per-caller bucket.
///
/// Tokens are kept in fixed point: one token is `window_nanos` units, so a
/// refill of `elapsed_nanos * max_events` units is exact and fractional
/// tokens carry over between requests.
#[derive(Debug, Clone)]
struct Bucket {
    units: u128,
    last_refill: Instant,
}

/// Each caller owns a bucket of `max_events` tokens that refills continuously
/// at `max_events / window` tokens per second.
///
/// A caller that has been idle for a full window can burst up to capacity.
pub struct TokenBucketLimiter {
    quota: Quota,
    /// Units per token, the window length in nanoseconds
    token_units: u128,
    /// `max_events` tokens expressed in units
    capacity_units: u128,
    buckets: DashMap<CallerId, Bucket>,
    clock: Arc<dyn Clock>,
}

impl TokenBucketLimiter {
    /// Create a token bucket limiter for `quota`.
    pub fn new(quota: Quota, clock: Arc<dyn Clock>) -> Self {
        let token_units = quota.window().as_nanos();
        Self {
            quota,
            token_units,
            capacity_units: token_units * u128::from(quota.max_events()),
            buckets: DashMap::new(),
            clock,
        }
    }

    /// Whole tokens currently held by `caller`, without refilling.
    ///
    /// Returns `None` for a caller that has not been seen.
    pub fn available_tokens(&self, caller: &CallerId) -> Option<u64> {
        self.buckets
            .get(caller)
            .map(|bucket| (bucket.units / self.token_units) as u64)
    }
}

impl RateAlgorithm for TokenBucketLimiter {
    fn try_acquire(&self, caller: &CallerId) -> bool {
        let now = self.clock.now();

        // The entry guard holds the shard lock until the end of this function.
        let mut bucket = self.buckets.entry(caller.clone()).or_insert_with(|| {
            debug!(caller = %caller, capacity = self.quota.max_events(), "Creating new token bucket");
            Bucket {
                units: self.capacity_units,
                last_refill: now,
            }
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let refilled = elapsed
            .as_nanos()
            .saturating_mul(u128::from(self.quota.max_events()));
        bucket.units = bucket
            .units
            .saturating_add(refilled)
            .min(self.capacity_units);
        bucket.last_refill = now;

        trace!(
            caller = %caller,
            tokens = bucket.units as f64 / self.token_units as f64,
            "Checking token bucket"
        );

        if bucket.units >= self.token_units {
            bucket.units -= self.token_units;
            true
        } else {
            debug!(caller = %caller, "Token bucket empty");
            false
        }
    }

    fn quota(&self) -> Quota {
        self.quota
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::TokenBucket
    }

    fn tracked_callers(&self) -> usize {
        self.buckets.len()
    }

    fn forget(&self, caller: &CallerId) -> bool {
        self.buckets.remove(caller).is_some()
    }
}
