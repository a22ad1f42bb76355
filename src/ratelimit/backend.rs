//! The capability contract shared by every limiting strategy.

use super::caller::CallerId;
use super::rules::{AlgorithmKind, Quota};

/// A per-caller rate limiting strategy.
///
/// Implementations own their per-caller state exclusively and must make each
/// `try_acquire` atomic for a given caller: two concurrent calls for the same
/// caller never both consume the last unit of quota.
pub trait RateAlgorithm: Send + Sync {
    /// Record one event for `caller` if the quota allows it.
    ///
    /// Returns `true` when the event was admitted and counted, `false` when it
    /// was denied. A denied event leaves no trace in the caller's quota.
    fn try_acquire(&self, caller: &CallerId) -> bool;

    /// The quota this limiter enforces.
    fn quota(&self) -> Quota;

    /// Which strategy this is.
    fn kind(&self) -> AlgorithmKind;

    /// Number of callers with live state.
    fn tracked_callers(&self) -> usize;

    /// Drop the state held for `caller`, returning whether any existed.
    ///
    /// Meant for the application's own eviction pass; the next event from the
    /// caller starts from a fresh state.
    fn forget(&self, caller: &CallerId) -> bool;
}
