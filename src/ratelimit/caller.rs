//! Caller identity handling.

use std::fmt;
use std::sync::Arc;

use super::rules::Tier;
use crate::error::{Result, TiergateError};

/// Opaque identity of a caller; the key into every limiter's per-caller map.
///
/// The id is validated once on construction and then shared cheaply, since
/// each limiter keeps its own copy as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerId(Arc<str>);

impl CallerId {
    /// Validate and wrap a raw caller id.
    ///
    /// Empty, whitespace-only and control-character-bearing ids are rejected.
    pub fn new(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(TiergateError::InvalidInput(
                "caller id cannot be empty".to_string(),
            ));
        }

        if raw.chars().any(char::is_control) {
            return Err(TiergateError::InvalidInput(format!(
                "caller id {:?} contains control characters",
                raw
            )));
        }

        Ok(Self(Arc::from(raw)))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CallerId {
    type Error = TiergateError;

    fn try_from(raw: &str) -> Result<Self> {
        Self::new(raw)
    }
}

/// A caller together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Who is asking.
    pub id: CallerId,
    /// Which quota applies.
    pub tier: Tier,
}

impl Caller {
    /// Create a caller, validating the id.
    pub fn new(id: &str, tier: Tier) -> Result<Self> {
        Ok(Self {
            id: CallerId::new(id)?,
            tier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_id_creation() {
        let id = CallerId::new("user-42@example.com").unwrap();
        assert_eq!(id.as_str(), "user-42@example.com");
        assert_eq!(id.to_string(), "user-42@example.com");
    }

    #[test]
    fn test_empty_caller_id_rejected() {
        assert!(matches!(
            CallerId::new(""),
            Err(TiergateError::InvalidInput(_))
        ));
        assert!(matches!(
            CallerId::new("   "),
            Err(TiergateError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_control_characters_rejected() {
        assert!(matches!(
            CallerId::new("user\n1"),
            Err(TiergateError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_caller_id_equality() {
        let a = CallerId::new("user1").unwrap();
        let b = CallerId::try_from("user1").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, CallerId::new("user2").unwrap());
    }

    #[test]
    fn test_caller_creation() {
        let caller = Caller::new("user1", Tier::Premium).unwrap();
        assert_eq!(caller.id.as_str(), "user1");
        assert_eq!(caller.tier, Tier::Premium);
        assert!(Caller::new("", Tier::Free).is_err());
    }
}
