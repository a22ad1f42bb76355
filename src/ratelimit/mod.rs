//! Rate limiting algorithms, tier rules and the limiter registry.

mod backend;
mod caller;
mod clock;
mod fixed_window;
mod limiter;
mod registry;
mod rules;
mod sliding_window;
mod token_bucket;

pub use backend::RateAlgorithm;
pub use caller::{Caller, CallerId};
pub use clock::{Clock, MockClock, SystemClock};
pub use fixed_window::FixedWindowLimiter;
pub use limiter::Limiter;
pub use registry::LimiterRegistry;
pub use rules::{AlgorithmKind, Quota, Tier, TierRule, TierRules};
pub use sliding_window::SlidingWindowLimiter;
pub use token_bucket::TokenBucketLimiter;
