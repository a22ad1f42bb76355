//! Tier to limiter mapping.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::clock::{Clock, SystemClock};
use super::limiter::Limiter;
use super::rules::{Tier, TierRules};
use super::RateAlgorithm;
use crate::error::{Result, TiergateError};

/// Owns one limiter per configured tier for its whole lifetime.
///
/// All callers of a tier share that tier's limiter; limiters of different
/// tiers are fully independent.
#[derive(Debug)]
pub struct LimiterRegistry {
    limiters: HashMap<Tier, Limiter>,
}

impl LimiterRegistry {
    /// Build a registry from a tier table using the system clock.
    pub fn from_rules(rules: &TierRules) -> Result<Self> {
        Self::with_clock(rules, Arc::new(SystemClock::new()))
    }

    /// Build a registry from a tier table with an explicit time source.
    ///
    /// The whole table is validated before any limiter is created.
    pub fn with_clock(rules: &TierRules, clock: Arc<dyn Clock>) -> Result<Self> {
        rules.validate()?;

        let mut limiters = HashMap::with_capacity(rules.tiers.len());
        for rule in &rules.tiers {
            let quota = rule.quota()?;
            info!(
                tier = %rule.tier,
                algorithm = %rule.algorithm,
                max_events = quota.max_events(),
                window = ?quota.window(),
                "Registering limiter"
            );
            limiters.insert(rule.tier, Limiter::build(rule.algorithm, quota, clock.clone()));
        }

        Ok(Self { limiters })
    }

    /// The limiter responsible for `tier`.
    ///
    /// A tier without a limiter is a configuration error; there is no
    /// fallback limiter.
    pub fn limiter_for(&self, tier: Tier) -> Result<&Limiter> {
        self.limiters.get(&tier).ok_or_else(|| {
            TiergateError::Config(format!("no rate limiter registered for tier '{}'", tier))
        })
    }

    /// Fail unless every tier has a limiter.
    pub fn ensure_complete(&self) -> Result<()> {
        let missing: Vec<&str> = Tier::ALL
            .iter()
            .filter(|tier| !self.limiters.contains_key(*tier))
            .map(|tier| tier.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TiergateError::Config(format!(
                "no rate limiter registered for tier(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Tiers with a registered limiter, in ascending order.
    pub fn tiers(&self) -> Vec<Tier> {
        Tier::ALL
            .into_iter()
            .filter(|tier| self.limiters.contains_key(tier))
            .collect()
    }

    /// Total callers tracked across all limiters.
    pub fn tracked_callers(&self) -> usize {
        self.limiters.values().map(|l| l.tracked_callers()).sum()
    }
}
