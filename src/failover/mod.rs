//! Failover subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     UpstreamConfig → candidate.rs → CandidateList [primary, backup1, ...]
//!
//! Per request:
//!     InboundRequest (body buffered once)
//!     → dispatcher.rs (walk candidates in order)
//!     → attempt.rs (bounded send, classify: accepted / rejected / transport failed)
//!     → FailoverDecision (forwarded response | fixed 503)
//! ```
//!
//! # Design Decisions
//! - Success predicate is `status < 500`; 4xx ends the sequence even from a backup
//! - Candidate list is read-only after startup; no locks on the request path
//! - One outbound request in flight per inbound request (sequential mode)

pub mod attempt;
pub mod candidate;
pub mod dispatcher;

pub use attempt::{
    is_accepted, AttemptOutcome, HttpUpstream, InboundRequest, OutboundRequest, OutcomeKind, TransportError, Upstream,
};
pub use candidate::{Candidate, CandidateList, Role};
pub use dispatcher::{unavailable, FailoverDecision, FailoverDispatcher, UNAVAILABLE_BODY};
