//! Tier rules: the static table mapping each tier to an algorithm and quota.
//!
//! The table is read once at startup, either built in code or loaded from a
//! YAML file such as:
//!
//! ```yaml
//! tiers:
//!   - tier: free
//!     algorithm: fixed_window
//!     max_events: 10
//!     window: 60s
//!   - tier: premium
//!     algorithm: token_bucket
//!     max_events: 100
//!     window: 1m
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, TiergateError};

/// Caller classification. Each tier maps to exactly one algorithm and quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
    Enterprise,
}

impl Tier {
    /// Every tier, in ascending order of privilege.
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Premium, Tier::Enterprise];

    /// Lowercase name used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
            Tier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = TiergateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "premium" => Ok(Tier::Premium),
            "enterprise" => Ok(Tier::Enterprise),
            other => Err(TiergateError::Config(format!("unknown tier '{}'", other))),
        }
    }
}

/// Which limiting strategy backs a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    TokenBucket,
    FixedWindow,
    SlidingWindow,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmKind::TokenBucket => "token_bucket",
            AlgorithmKind::FixedWindow => "fixed_window",
            AlgorithmKind::SlidingWindow => "sliding_window",
        };
        f.write_str(name)
    }
}

/// Maximum number of events admitted per window.
///
/// Both fields are strictly positive; the only way to build one is through
/// [`Quota::new`], which enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    max_events: u64,
    window: Duration,
}

impl Quota {
    /// Create a validated quota.
    pub fn new(max_events: u64, window: Duration) -> Result<Self> {
        if max_events == 0 {
            return Err(TiergateError::Config(
                "max_events must be greater than 0".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(TiergateError::Config(
                "window must be greater than 0".to_string(),
            ));
        }
        Ok(Self { max_events, window })
    }

    /// Events allowed per window.
    pub fn max_events(&self) -> u64 {
        self.max_events
    }

    /// Length of the window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

/// One row of the tier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRule {
    /// The tier this rule applies to
    pub tier: Tier,
    /// Strategy used for callers of this tier
    pub algorithm: AlgorithmKind,
    /// Events allowed per window
    pub max_events: u64,
    /// Window length, in humantime notation (`500ms`, `10s`, `1m`)
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl TierRule {
    /// Create a rule. Validation is deferred to [`TierRule::quota`].
    pub fn new(tier: Tier, algorithm: AlgorithmKind, max_events: u64, window: Duration) -> Self {
        Self {
            tier,
            algorithm,
            max_events,
            window,
        }
    }

    /// The validated quota of this rule.
    pub fn quota(&self) -> Result<Quota> {
        Quota::new(self.max_events, self.window).map_err(|e| match e {
            TiergateError::Config(msg) => {
                TiergateError::Config(format!("tier '{}': {}", self.tier, msg))
            }
            other => other,
        })
    }
}

/// The full tier table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRules {
    /// One rule per tier
    #[serde(default)]
    pub tiers: Vec<TierRule>,
}

impl TierRules {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table: free callers get a fixed window of 10 per minute,
    /// premium a token bucket of 100 per minute, enterprise an exact sliding
    /// window of 1000 per minute.
    pub fn standard() -> Self {
        let minute = Duration::from_secs(60);
        Self::new()
            .with_rule(TierRule::new(Tier::Free, AlgorithmKind::FixedWindow, 10, minute))
            .with_rule(TierRule::new(Tier::Premium, AlgorithmKind::TokenBucket, 100, minute))
            .with_rule(TierRule::new(
                Tier::Enterprise,
                AlgorithmKind::SlidingWindow,
                1000,
                minute,
            ))
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: TierRule) -> Self {
        self.tiers.push(rule);
        self
    }

    /// Load rules from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading tier rules");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load rules from a YAML string.
    ///
    /// Accepts either a document with a top-level `tiers` key or a bare list
    /// of rules.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let parse_error =
            |e: serde_yaml::Error| TiergateError::Config(format!("Failed to parse tier rules: {}", e));

        let root: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(parse_error)?;
        if root.is_sequence() {
            let tiers = serde_yaml::from_value(root).map_err(parse_error)?;
            return Ok(Self { tiers });
        }

        serde_yaml::from_value(root).map_err(parse_error)
    }

    /// Check every quota and reject duplicate tiers.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.tiers {
            rule.quota()?;
            if !seen.insert(rule.tier) {
                return Err(TiergateError::Config(format!(
                    "tier '{}' is configured more than once",
                    rule.tier
                )));
            }
        }
        Ok(())
    }

    /// The rule for a tier, if one is configured.
    pub fn rule_for(&self, tier: Tier) -> Option<&TierRule> {
        self.tiers.iter().find(|rule| rule.tier == tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules_document() {
        let yaml = r#"
tiers:
  - tier: free
    algorithm: fixed_window
    max_events: 10
    window: 60s
  - tier: enterprise
    algorithm: sliding_window
    max_events: 1000
    window: 1m
"#;
        let rules = TierRules::from_yaml(yaml).unwrap();
        assert_eq!(rules.tiers.len(), 2);

        let free = rules.rule_for(Tier::Free).unwrap();
        assert_eq!(free.algorithm, AlgorithmKind::FixedWindow);
        assert_eq!(free.max_events, 10);
        assert_eq!(free.window, Duration::from_secs(60));

        let enterprise = rules.rule_for(Tier::Enterprise).unwrap();
        assert_eq!(enterprise.window, Duration::from_secs(60));
        assert!(rules.rule_for(Tier::Premium).is_none());
    }

    #[test]
    fn test_parse_bare_rule_list() {
        let yaml = r#"
- tier: premium
  algorithm: token_bucket
  max_events: 5
  window: 500ms
"#;
        let rules = TierRules::from_yaml(yaml).unwrap();
        let premium = rules.rule_for(Tier::Premium).unwrap();
        assert_eq!(premium.algorithm, AlgorithmKind::TokenBucket);
        assert_eq!(premium.window, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_rejects_unknown_algorithm() {
        let yaml = r#"
tiers:
  - tier: free
    algorithm: leaky_bucket
    max_events: 10
    window: 60s
"#;
        assert!(matches!(
            TierRules::from_yaml(yaml),
            Err(TiergateError::Config(_))
        ));
    }

    #[test]
    fn test_bare_list_reports_field_error() {
        let yaml = r#"
- tier: free
  algorithm: leaky_bucket
  max_events: 10
  window: 60s
"#;
        let err = TierRules::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, TiergateError::Config(_)));
        let message = err.to_string();
        assert!(message.contains("leaky_bucket"), "{}", message);
        assert!(!message.contains("expected struct TierRules"), "{}", message);
    }

    #[test]
    fn test_quota_validation() {
        assert!(Quota::new(10, Duration::from_secs(1)).is_ok());
        assert!(matches!(
            Quota::new(0, Duration::from_secs(1)),
            Err(TiergateError::Config(_))
        ));
        assert!(matches!(
            Quota::new(10, Duration::ZERO),
            Err(TiergateError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_quota() {
        let rules = TierRules::new().with_rule(TierRule::new(
            Tier::Free,
            AlgorithmKind::FixedWindow,
            0,
            Duration::from_secs(60),
        ));
        let err = rules.validate().unwrap_err();
        assert!(err.to_string().contains("free"));
    }

    #[test]
    fn test_validate_rejects_duplicate_tier() {
        let minute = Duration::from_secs(60);
        let rules = TierRules::new()
            .with_rule(TierRule::new(Tier::Free, AlgorithmKind::FixedWindow, 10, minute))
            .with_rule(TierRule::new(Tier::Free, AlgorithmKind::TokenBucket, 20, minute));
        assert!(matches!(rules.validate(), Err(TiergateError::Config(_))));
    }

    #[test]
    fn test_standard_rules() {
        let rules = TierRules::standard();
        rules.validate().unwrap();
        assert_eq!(
            rules.rule_for(Tier::Free).unwrap().algorithm,
            AlgorithmKind::FixedWindow
        );
        assert_eq!(
            rules.rule_for(Tier::Premium).unwrap().algorithm,
            AlgorithmKind::TokenBucket
        );
        assert_eq!(rules.rule_for(Tier::Enterprise).unwrap().max_events, 1000);
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("free".parse::<Tier>().unwrap(), Tier::Free);
        assert_eq!(" Premium ".parse::<Tier>().unwrap(), Tier::Premium);
        assert_eq!("ENTERPRISE".parse::<Tier>().unwrap(), Tier::Enterprise);
        assert!(matches!(
            "gold".parse::<Tier>(),
            Err(TiergateError::Config(_))
        ));
    }

    #[test]
    fn test_rules_yaml_round_trip_keeps_humantime_window() {
        let rules = TierRules::standard();
        let yaml = serde_yaml::to_string(&rules).unwrap();
        assert!(yaml.contains("1m"));
        assert_eq!(TierRules::from_yaml(&yaml).unwrap(), rules);
    }
}
