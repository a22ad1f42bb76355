//! Admission service implementation.

use std::sync::Arc;
use tracing::instrument;

use super::observer::DecisionObserver;
use crate::error::Result;
use crate::ratelimit::{Caller, CallerId, LimiterRegistry, RateAlgorithm, Tier};

/// Stateless facade the application calls for every incoming event.
///
/// All quota state lives in the limiters owned by the registry; cloning the
/// service only clones handles.
#[derive(Clone)]
pub struct AdmissionService {
    /// Registry resolving tiers to limiters
    registry: Arc<LimiterRegistry>,
    /// Optional decision sink
    observer: Option<Arc<dyn DecisionObserver>>,
}

impl AdmissionService {
    /// Create a service over `registry` with no observer.
    pub fn new(registry: Arc<LimiterRegistry>) -> Self {
        Self {
            registry,
            observer: None,
        }
    }

    /// Attach an observer notified of every decision.
    pub fn with_observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Decide whether one event from `caller_id` in `tier` may proceed.
    ///
    /// `Ok(true)` means the event was admitted and counted, `Ok(false)` that
    /// it was denied. An invalid caller id fails with `InvalidInput` before
    /// any limiter is touched; a tier without a limiter fails with `Config`.
    #[instrument(level = "trace", skip(self))]
    pub fn admit(&self, caller_id: &str, tier: Tier) -> Result<bool> {
        let caller = CallerId::new(caller_id)?;
        self.admit_id(&caller, tier)
    }

    /// Same as [`admit`](Self::admit) for an already validated caller.
    pub fn admit_caller(&self, caller: &Caller) -> Result<bool> {
        self.admit_id(&caller.id, caller.tier)
    }

    /// The registry backing this service.
    pub fn registry(&self) -> &LimiterRegistry {
        &self.registry
    }

    fn admit_id(&self, caller: &CallerId, tier: Tier) -> Result<bool> {
        let limiter = self.registry.limiter_for(tier)?;
        let admitted = limiter.try_acquire(caller);

        if let Some(observer) = &self.observer {
            observer.on_decision(caller, tier, admitted);
        }

        Ok(admitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TiergateError;
    use crate::ratelimit::{AlgorithmKind, MockClock, TierRule, TierRules};
    use parking_lot::Mutex;
    use std::sync::Barrier;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingObserver {
        decisions: Mutex<Vec<(String, Tier, bool)>>,
    }

    impl DecisionObserver for RecordingObserver {
        fn on_decision(&self, caller: &CallerId, tier: Tier, admitted: bool) {
            self.decisions
                .lock()
                .push((caller.to_string(), tier, admitted));
        }
    }

    fn small_rules() -> TierRules {
        let minute = Duration::from_secs(60);
        TierRules::new()
            .with_rule(TierRule::new(Tier::Free, AlgorithmKind::FixedWindow, 2, minute))
            .with_rule(TierRule::new(Tier::Premium, AlgorithmKind::TokenBucket, 3, minute))
            .with_rule(TierRule::new(Tier::Enterprise, AlgorithmKind::SlidingWindow, 4, minute))
    }

    fn service(rules: &TierRules) -> (AdmissionService, MockClock) {
        let clock = MockClock::new();
        let registry = LimiterRegistry::with_clock(rules, Arc::new(clock.clone())).unwrap();
        (AdmissionService::new(Arc::new(registry)), clock)
    }

    #[test]
    fn test_admit_applies_tier_quota() {
        let (service, _clock) = service(&small_rules());

        let free: Vec<bool> = (0..3).map(|_| service.admit("u", Tier::Free).unwrap()).collect();
        assert_eq!(free, vec![true, true, false]);

        let enterprise = (0..5)
            .filter(|_| service.admit("v", Tier::Enterprise).unwrap())
            .count();
        assert_eq!(enterprise, 4);
    }

    #[test]
    fn test_tiers_are_isolated() {
        let (service, _clock) = service(&small_rules());

        while service.admit("user1", Tier::Free).unwrap() {}

        // Same caller id under another tier has its own, untouched quota
        for _ in 0..3 {
            assert!(service.admit("user1", Tier::Premium).unwrap());
        }
        assert!(service.admit("user1", Tier::Enterprise).unwrap());
    }

    #[test]
    fn test_unregistered_tier_never_allows() {
        let rules = TierRules::new().with_rule(TierRule::new(
            Tier::Free,
            AlgorithmKind::FixedWindow,
            10,
            Duration::from_secs(60),
        ));
        let (service, _clock) = service(&rules);

        assert!(matches!(
            service.admit("user1", Tier::Enterprise),
            Err(TiergateError::Config(_))
        ));
    }

    #[test]
    fn test_admit_caller_surfaces_unregistered_tier() {
        let rules = TierRules::new().with_rule(TierRule::new(
            Tier::Free,
            AlgorithmKind::FixedWindow,
            10,
            Duration::from_secs(60),
        ));
        let (service, _clock) = service(&rules);

        let free = Caller::new("user1", Tier::Free).unwrap();
        let premium = Caller::new("user2", Tier::Premium).unwrap();
        assert!(service.admit_caller(&free).unwrap());
        assert!(matches!(
            service.admit_caller(&premium),
            Err(TiergateError::Config(_))
        ));
        assert_eq!(service.registry().tracked_callers(), 1);
    }

    #[test]
    fn test_invalid_caller_rejected_before_limiter() {
        let (service, _clock) = service(&small_rules());

        assert!(matches!(
            service.admit("", Tier::Free),
            Err(TiergateError::InvalidInput(_))
        ));
        assert_eq!(service.registry().tracked_callers(), 0);
    }

    #[test]
    fn test_observer_sees_every_decision() {
        let (service, _clock) = service(&small_rules());
        let observer = Arc::new(RecordingObserver::default());
        let service = service.with_observer(observer.clone());

        let caller = Caller::new("user1", Tier::Free).unwrap();
        for _ in 0..3 {
            service.admit_caller(&caller).unwrap();
        }

        let decisions = observer.decisions.lock();
        assert_eq!(
            *decisions,
            vec![
                ("user1".to_string(), Tier::Free, true),
                ("user1".to_string(), Tier::Free, true),
                ("user1".to_string(), Tier::Free, false),
            ]
        );
    }

    #[test]
    fn test_token_bucket_scenario_through_service() {
        let rules = TierRules::new().with_rule(TierRule::new(
            Tier::Premium,
            AlgorithmKind::TokenBucket,
            5,
            Duration::from_secs(10),
        ));
        let (service, clock) = service(&rules);

        let burst: Vec<bool> = (0..6).map(|_| service.admit("p", Tier::Premium).unwrap()).collect();
        assert_eq!(burst, vec![true, true, true, true, true, false]);

        clock.advance(Duration::from_secs(2));
        assert!(service.admit("p", Tier::Premium).unwrap());
        assert!(!service.admit("p", Tier::Premium).unwrap());
    }

    #[test]
    fn test_concurrent_admission_across_clones() {
        let (service, _clock) = service(&small_rules());
        let threads = 32;
        let barrier = Barrier::new(threads);

        let allowed = std::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let service = service.clone();
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        service.admit("shared", Tier::Enterprise).unwrap()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|allowed| *allowed)
                .count()
        });

        assert_eq!(allowed, 4);
    }
}
