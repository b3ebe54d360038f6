//! Ordered failover across the candidate list.
//!
//! # State Machine
//! ```text
//! Ready(remaining) → Attempting(candidate) → Accepted            (terminal)
//!                                          → Rejected        ─┐
//!                                          → TransportFailed ─┴→ Attempting(next) | Exhausted (terminal)
//! ```
//!
//! Every request starts fresh from the primary. Nothing observed while
//! serving one request influences another.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::config::{DispatchMode, UpstreamConfig};
use crate::failover::attempt::{attempt, Attempt, AttemptOutcome, InboundRequest, Upstream};
use crate::failover::candidate::{Candidate, CandidateList};
use crate::observability::metrics;

/// Body of the synthetic exhaustion response.
pub const UNAVAILABLE_BODY: &str = "Service unavailable";

/// Terminal outcome of a whole request.
pub enum FailoverDecision {
    /// Response of the accepting candidate, untouched.
    Forwarded {
        candidate: Candidate,
        response: Response<Body>,
    },
    /// Every candidate failed or was rejected.
    Unavailable,
}

impl FailoverDecision {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FailoverDecision::Unavailable)
    }

    /// Candidate that satisfied the request, if any.
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            FailoverDecision::Forwarded { candidate, .. } => Some(candidate),
            FailoverDecision::Unavailable => None,
        }
    }
}

impl IntoResponse for FailoverDecision {
    fn into_response(self) -> axum::response::Response {
        match self {
            FailoverDecision::Forwarded { response, .. } => response,
            FailoverDecision::Unavailable => unavailable(),
        }
    }
}

/// The fixed exhaustion response: 503, `text/plain`, `Service unavailable`.
pub fn unavailable() -> Response<Body> {
    let mut response = Response::new(Body::from(UNAVAILABLE_BODY));
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

/// Delivers each request to the first candidate that accepts it.
pub struct FailoverDispatcher<U> {
    candidates: Arc<CandidateList>,
    upstream: U,
    attempt_timeout: Duration,
    mode: DispatchMode,
}

impl<U: Upstream> FailoverDispatcher<U> {
    pub fn new(candidates: Arc<CandidateList>, upstream: U, attempt_timeout: Duration, mode: DispatchMode) -> Self {
        Self {
            candidates,
            upstream,
            attempt_timeout,
            mode,
        }
    }

    /// Build a dispatcher from the upstream section of the configuration.
    pub fn from_config(candidates: Arc<CandidateList>, upstream: U, config: &UpstreamConfig) -> Self {
        Self::new(
            candidates,
            upstream,
            Duration::from_millis(config.attempt_timeout_ms),
            config.mode,
        )
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Run the failover policy for one request.
    pub async fn dispatch(&self, request: &InboundRequest, request_id: &str) -> FailoverDecision {
        let started = Instant::now();
        let decision = match self.mode {
            DispatchMode::Sequential => self.dispatch_sequential(request, request_id).await,
            DispatchMode::Race => self.dispatch_race(request, request_id).await,
        };

        match decision.candidate() {
            Some(candidate) if !candidate.is_primary() => {
                tracing::info!(
                    request_id = %request_id,
                    candidate = %candidate,
                    order = candidate.order(),
                    "Failed over to {}",
                    candidate
                );
                metrics::record_failover(candidate.base_url());
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    request_id = %request_id,
                    candidates = self.candidates.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "All candidates failed"
                );
                metrics::record_exhausted();
            }
        }
        decision
    }

    async fn dispatch_sequential(&self, request: &InboundRequest, request_id: &str) -> FailoverDecision {
        for candidate in self.candidates.iter() {
            let Attempt { outcome, response } = attempt(&self.upstream, candidate, request, self.attempt_timeout).await;
            observe(&outcome, request_id);

            if let Some(response) = response {
                return FailoverDecision::Forwarded {
                    candidate: outcome.candidate,
                    response,
                };
            }
        }
        FailoverDecision::Unavailable
    }

    /// All attempts in flight at once; the lowest-order acceptance wins.
    ///
    /// An acceptance from candidate `i` is only returned once every candidate
    /// before it has resolved as a failure, so the decision matches what the
    /// sequential policy would pick. Pending attempts are dropped on return.
    async fn dispatch_race(&self, request: &InboundRequest, request_id: &str) -> FailoverDecision {
        let mut in_flight = FuturesUnordered::new();
        for candidate in self.candidates.iter() {
            in_flight.push(self.ordered_attempt(candidate, request));
        }

        let mut slots: Vec<Option<Attempt>> = (0..self.candidates.len()).map(|_| None).collect();
        let mut next = 0;

        while let Some((order, result)) = in_flight.next().await {
            observe(&result.outcome, request_id);
            slots[order] = Some(result);

            while next < slots.len() {
                match slots[next].take() {
                    None => break,
                    Some(Attempt {
                        outcome,
                        response: Some(response),
                    }) => {
                        return FailoverDecision::Forwarded {
                            candidate: outcome.candidate,
                            response,
                        };
                    }
                    Some(_) => next += 1,
                }
            }
        }
        FailoverDecision::Unavailable
    }

    async fn ordered_attempt(&self, candidate: &Candidate, request: &InboundRequest) -> (usize, Attempt) {
        let result = attempt(&self.upstream, candidate, request, self.attempt_timeout).await;
        (candidate.order(), result)
    }
}

fn observe(outcome: &AttemptOutcome, request_id: &str) {
    outcome.log(request_id);
    metrics::record_attempt(outcome.candidate.base_url(), outcome.kind().as_str(), outcome.elapsed);
}
