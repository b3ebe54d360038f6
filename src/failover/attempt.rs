//! One bounded attempt against a single candidate.
//!
//! # Responsibilities
//! - Hold the buffered inbound request so it can be replayed verbatim
//! - Define the transport seam (`Upstream`) and its hyper implementation
//! - Classify each attempt as accepted, rejected or transport-failed

use std::future::Future;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, request, HeaderMap, Method, Response, StatusCode, Uri};
use bytes::Bytes;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::failover::candidate::{Candidate, Role};
use crate::resilience::with_deadline;

/// Headers that describe the inbound connection rather than the request.
///
/// `host` names the gateway and is re-derived from the candidate origin;
/// `transfer-encoding` is re-derived from the buffered body.
const CONNECTION_SCOPED: [header::HeaderName; 2] = [header::HOST, header::TRANSFER_ENCODING];

/// The request being proxied, with its body captured once for replay.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: Method, path_and_query: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            headers,
            body,
        }
    }

    /// Capture a request from its head and an already-buffered body.
    pub fn from_parts(parts: &request::Parts, body: Bytes) -> Self {
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Self::new(parts.method.clone(), path_and_query, parts.headers.clone(), body)
    }

    /// The request as sent to `candidate`.
    pub fn to_outbound(&self, candidate: &Candidate) -> OutboundRequest {
        let mut headers = self.headers.clone();
        for name in CONNECTION_SCOPED.iter() {
            headers.remove(name);
        }
        OutboundRequest {
            method: self.method.clone(),
            url: candidate.target(&self.path_and_query),
            headers,
            body: self.body.clone(),
        }
    }
}

/// A fully-resolved request for one candidate.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failure before any response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("timeout")]
    Timeout,
    #[error("connect/dns/tls error: {0}")]
    Connect(String),
    #[error("request error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout => "timeout",
            TransportError::Connect(_) => "connect",
            TransportError::Other(_) => "other",
        }
    }
}

impl From<hyper_util::client::legacy::Error> for TransportError {
    fn from(e: hyper_util::client::legacy::Error) -> Self {
        if e.is_connect() {
            return TransportError::Connect(e.to_string());
        }
        TransportError::Other(e.to_string())
    }
}

/// Transport used to deliver an outbound request.
pub trait Upstream: Send + Sync + 'static {
    fn send(&self, request: OutboundRequest) -> impl Future<Output = Result<Response<Body>, TransportError>> + Send;
}

type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Production transport backed by a pooled hyper client.
///
/// The client writes exactly the headers it is given, plus `host` and the
/// body framing. Redirects are not followed and nothing is decompressed,
/// so the caller sees exactly what the candidate sent.
#[derive(Clone)]
pub struct HttpUpstream {
    client: HttpsClient,
}

impl HttpUpstream {
    pub fn new() -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_all_versions()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

impl Default for HttpUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl Upstream for HttpUpstream {
    async fn send(&self, request: OutboundRequest) -> Result<Response<Body>, TransportError> {
        let uri = Uri::try_from(request.url.as_str())
            .map_err(|e| TransportError::Other(format!("invalid target {}: {}", request.url, e)))?;

        let mut outbound = hyper::Request::new(Body::from(request.body));
        *outbound.method_mut() = request.method;
        *outbound.uri_mut() = uri;
        *outbound.headers_mut() = request.headers;

        let (parts, body) = self.client.request(outbound).await?.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Whether a response ends the sequence.
///
/// Everything below 500, client errors included, is final.
pub fn is_accepted(status: StatusCode) -> bool {
    status.as_u16() < 500
}

/// Classification of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Accepted,
    Rejected,
    TransportFailed,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Accepted => "accepted",
            OutcomeKind::Rejected => "rejected",
            OutcomeKind::TransportFailed => "transport_failed",
        }
    }
}

/// Per-candidate result of one dispatch.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub candidate: Candidate,
    pub status: Option<StatusCode>,
    pub error: Option<TransportError>,
    pub elapsed: Duration,
    pub timed_out: bool,
}

impl AttemptOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self.status {
            Some(status) if is_accepted(status) => OutcomeKind::Accepted,
            Some(_) => OutcomeKind::Rejected,
            None => OutcomeKind::TransportFailed,
        }
    }

    pub fn role(&self) -> Role {
        self.candidate.role()
    }

    /// Emit the per-attempt log record.
    pub fn log(&self, request_id: &str) {
        let kind = self.kind();
        let elapsed_ms = self.elapsed.as_millis() as u64;
        let status = self.status.map(|s| s.as_u16());
        let error = self.error.as_ref().map(|e| e.to_string());
        match kind {
            OutcomeKind::Accepted => tracing::debug!(
                request_id = %request_id,
                candidate = %self.candidate,
                role = %self.candidate.role(),
                order = self.candidate.order(),
                outcome = kind.as_str(),
                status = ?status,
                elapsed_ms,
                "Attempt finished"
            ),
            _ => tracing::warn!(
                request_id = %request_id,
                candidate = %self.candidate,
                role = %self.candidate.role(),
                order = self.candidate.order(),
                outcome = kind.as_str(),
                status = ?status,
                error = ?error,
                timed_out = self.timed_out,
                elapsed_ms,
                "Attempt failed"
            ),
        }
    }
}

/// Outcome plus the response to forward, present only when accepted.
pub struct Attempt {
    pub outcome: AttemptOutcome,
    pub response: Option<Response<Body>>,
}

/// Deliver `request` to `candidate`, bounded by `limit`.
///
/// On elapse the in-flight send is dropped and the attempt is reported as a
/// transport failure with `timed_out` set.
pub async fn attempt<U: Upstream>(
    upstream: &U,
    candidate: &Candidate,
    request: &InboundRequest,
    limit: Duration,
) -> Attempt {
    let outbound = request.to_outbound(candidate);
    let (result, elapsed) = with_deadline(limit, upstream.send(outbound)).await;

    let (status, error, timed_out, response) = match result {
        Ok(Ok(response)) => {
            let status = response.status();
            let keep = is_accepted(status).then_some(response);
            (Some(status), None, false, keep)
        }
        Ok(Err(e)) => {
            let timed_out = e == TransportError::Timeout;
            (None, Some(e), timed_out, None)
        }
        Err(_) => (None, Some(TransportError::Timeout), true, None),
    };

    Attempt {
        outcome: AttemptOutcome {
            candidate: candidate.clone(),
            status,
            error,
            elapsed,
            timed_out,
        },
        response,
    }
}
