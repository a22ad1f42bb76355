//! Tiergate - Tiered Admission Control
//!
//! This crate decides, per caller and per time interval, whether an event may
//! proceed. Each caller tier is served by one limiter (token bucket, fixed
//! window or sliding window) with its own quota, and the
//! [`AdmissionService`](admission::AdmissionService) is the single entry point
//! the embedding application calls.
//!
//! ```
//! use std::sync::Arc;
//! use tiergate::admission::AdmissionService;
//! use tiergate::ratelimit::{LimiterRegistry, Tier, TierRules};
//!
//! let registry = LimiterRegistry::from_rules(&TierRules::standard()).unwrap();
//! let service = AdmissionService::new(Arc::new(registry));
//! assert!(service.admit("user1", Tier::Free).unwrap());
//! ```

pub mod admission;
pub mod config;
pub mod error;
pub mod ratelimit;
