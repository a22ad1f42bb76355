//! Fixed window counter limiter.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::backend::RateAlgorithm;
use super::caller::CallerId;
use super::clock::Clock;
use super::rules::{AlgorithmKind, Quota};

/// Per-caller window.
#[derive(Debug, Clone)]
struct Window {
    start: Instant,
    count: u64,
}

/// Counts events in consecutive windows of length `window`, each anchored at
/// the first event a caller sends after the previous window expired.
///
/// Windows are not aligned to wall-clock boundaries. A burst that straddles
/// the end of one window and the start of the next can admit up to
/// `2 * max_events - 1` events in a short span, since the event that anchors
/// a window counts toward it; this is inherent to the algorithm.
pub struct FixedWindowLimiter {
    quota: Quota,
    windows: DashMap<CallerId, Window>,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    /// Create a fixed window limiter for `quota`.
    pub fn new(quota: Quota, clock: Arc<dyn Clock>) -> Self {
        Self {
            quota,
            windows: DashMap::new(),
            clock,
        }
    }

    /// Events counted in the caller's current window, if the caller is known.
    pub fn current_count(&self, caller: &CallerId) -> Option<u64> {
        self.windows.get(caller).map(|window| window.count)
    }

    /// Time left before the caller's current window expires.
    pub fn duration_until_reset(&self, caller: &CallerId) -> Option<Duration> {
        let now = self.clock.now();
        self.windows.get(caller).map(|window| {
            self.quota
                .window()
                .saturating_sub(now.saturating_duration_since(window.start))
        })
    }
}

impl RateAlgorithm for FixedWindowLimiter {
    fn try_acquire(&self, caller: &CallerId) -> bool {
        let now = self.clock.now();
        let max_events = self.quota.max_events();

        let mut window = match self.windows.entry(caller.clone()) {
            Entry::Vacant(vacant) => {
                debug!(caller = %caller, limit = max_events, "Opening first window");
                vacant.insert(Window { start: now, count: 1 });
                return true;
            }
            Entry::Occupied(occupied) => occupied.into_ref(),
        };

        if now.saturating_duration_since(window.start) > self.quota.window() {
            trace!(caller = %caller, "Window expired, opening a new one");
            window.start = now;
            window.count = 1;
            return true;
        }

        if window.count < max_events {
            window.count += 1;
            trace!(caller = %caller, count = window.count, "Counted in current window");
            true
        } else {
            debug!(caller = %caller, "Fixed window limit exceeded");
            false
        }
    }

    fn quota(&self) -> Quota {
        self.quota
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::FixedWindow
    }

    fn tracked_callers(&self) -> usize {
        self.windows.len()
    }

    fn forget(&self, caller: &CallerId) -> bool {
        self.windows.remove(caller).is_some()
    }
}
