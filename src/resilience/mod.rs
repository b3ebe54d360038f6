//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against a candidate:
//!     → timeouts.rs (enforce per-attempt deadline, cancel on elapse)
//!     → failover dispatcher decides whether to move on
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries against the same candidate and no backoff: failure advances the sequence
//! - No memory across requests (no circuit breaking, no health state)

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineElapsed};
