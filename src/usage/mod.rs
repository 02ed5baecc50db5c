//! Daily message quota for gated actions.
//!
//! `UsageLimiter::check_limit` is a read-only decision and
//! `UsageLimiter::record_usage` is the only mutator. Callers check first, do
//! the gated work, then record. The limiter never re-checks inside
//! `record_usage`; recording past an exhausted quota is a caller bug.

pub mod limiter;
pub mod window;

pub use limiter::{UsageError, UsageLimiter};
pub use window::ResetWindow;
