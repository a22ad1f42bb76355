//! Hooks for reporting admission decisions outside the core.

use tracing::info;

use crate::ratelimit::{CallerId, Tier};

/// Receives every decision made by an [`AdmissionService`](super::AdmissionService).
///
/// Observers are optional; admission never depends on one being attached.
pub trait DecisionObserver: Send + Sync {
    /// Called after the limiter has decided.
    fn on_decision(&self, caller: &CallerId, tier: Tier, admitted: bool);
}

/// Emits one `tracing` event per decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DecisionObserver for TracingObserver {
    fn on_decision(&self, caller: &CallerId, tier: Tier, admitted: bool) {
        if admitted {
            info!(caller = %caller, tier = %tier, "Request allowed");
        } else {
            info!(caller = %caller, tier = %tier, "Request denied");
        }
    }
}
