//! Configuration management for Tiergate.
//!
//! Settings come from an optional YAML file overlaid with `TIERGATE__*`
//! environment variables, e.g. `TIERGATE__LOGGING__LEVEL=debug`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ratelimit::TierRules;

/// Main configuration for Tiergate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiergateConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Rate limiting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Path to the tier rules file; the built-in table is used when unset
    pub rules_path: Option<String>,

    /// Refuse to start unless every tier has a limiter
    #[serde(default = "default_require_all_tiers")]
    pub require_all_tiers: bool,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            require_all_tiers: default_require_all_tiers(),
        }
    }
}

fn default_require_all_tiers() -> bool {
    true
}

impl TiergateConfig {
    /// Load configuration from an optional file plus environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path));
        }

        let config = builder
            .add_source(
                ::config::Environment::with_prefix("TIERGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Load configuration from a YAML string, without environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config = ::config::Config::builder()
            .add_source(::config::File::from_str(yaml, ::config::FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// The tier table this configuration points at.
    pub fn tier_rules(&self) -> Result<TierRules> {
        match &self.rate_limiting.rules_path {
            Some(path) => TierRules::from_file(path),
            None => Ok(TierRules::standard()),
        }
    }
}
