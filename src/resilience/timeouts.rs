//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a hard wall-clock bound
//! - Cancel the in-flight operation when the bound elapses
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Cancellation is dropping the future; the caller never waits for it to unwind
//! - Timeout errors are distinct from the operation's own errors

use std::future::Future;
use std::time::{Duration, Instant};

/// The deadline elapsed before the operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {}ms elapsed", .0.as_millis())]
pub struct DeadlineElapsed(pub Duration);

/// Run `operation` with a hard bound, returning its output and the time it took.
pub async fn with_deadline<F>(limit: Duration, operation: F) -> (Result<F::Output, DeadlineElapsed>, Duration)
where
    F: Future,
{
    let started = Instant::now();
    let result = tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| DeadlineElapsed(limit));
    (result, started.elapsed())
}
