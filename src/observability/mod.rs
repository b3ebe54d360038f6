//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP surface and failover core produce:
//!     → logging.rs (structured log events, one per attempt)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, separate listener)
//! ```
//!
//! # Design Decisions
//! - Upstream error details go to logs only, never to the caller
//! - Request ID (inbound `x-request-id` or generated) correlates all records of a request
//! - Metrics are cheap and a no-op without an installed recorder

pub mod logging;
pub mod metrics;
