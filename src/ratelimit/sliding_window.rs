//! Sliding window log limiter.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

use super::backend::RateAlgorithm;
use super::caller::CallerId;
use super::clock::Clock;
use super::rules::{AlgorithmKind, Quota};

/// Exact sliding window: every admitted event's timestamp is kept, oldest
/// first, until it falls out of the trailing window.
///
/// No trailing interval of length `window` ever contains more than
/// `max_events` admitted events. Memory per caller is bounded by
/// `max_events` timestamps.
pub struct SlidingWindowLimiter {
    quota: Quota,
    logs: DashMap<CallerId, VecDeque<Instant>>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    /// Create a sliding window limiter for `quota`.
    pub fn new(quota: Quota, clock: Arc<dyn Clock>) -> Self {
        Self {
            quota,
            logs: DashMap::new(),
            clock,
        }
    }

    /// Events in the caller's log, including ones that may have expired since
    /// the caller's last request.
    pub fn logged_events(&self, caller: &CallerId) -> Option<usize> {
        self.logs.get(caller).map(|log| log.len())
    }
}

impl RateAlgorithm for SlidingWindowLimiter {
    fn try_acquire(&self, caller: &CallerId) -> bool {
        let now = self.clock.now();
        let window = self.quota.window();
        let max_events = self.quota.max_events();

        let mut log = self.logs.entry(caller.clone()).or_insert_with(|| {
            debug!(caller = %caller, limit = max_events, "Creating new event log");
            VecDeque::new()
        });

        // The log is time-ordered, so expiry only ever trims a prefix
        while log
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) > window)
        {
            log.pop_front();
        }

        trace!(caller = %caller, in_window = log.len(), "Checking sliding window");

        if (log.len() as u64) < max_events {
            log.push_back(now);
            true
        } else {
            debug!(caller = %caller, "Sliding window limit exceeded");
            false
        }
    }

    fn quota(&self) -> Quota {
        self.quota
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::SlidingWindow
    }

    fn tracked_callers(&self) -> usize {
        self.logs.len()
    }

    fn forget(&self, caller: &CallerId) -> bool {
        self.logs.remove(caller).is_some()
    }
}
