//! Inbound request handling.
//!
//! # Responsibilities
//! - Correlate each request with an ID for logging
//! - Capture the body once so it can be replayed to every candidate
//!
//! # Design Decisions
//! - The ID is never injected into the forwarded request; headers go out as received
//! - Bodies are buffered up to a bound; larger bodies are rejected, never streamed

use std::error::Error as _;

use axum::body::{Body, Bytes};
use axum::http::HeaderMap;
use http_body_util::LengthLimitError;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation ID for a request: the inbound `x-request-id`, or a fresh UUID v4.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// The inbound body could not be captured for replay.
#[derive(Debug, thiserror::Error)]
#[error("request body exceeds {limit} bytes or could not be read: {source}")]
pub struct BodyCaptureError {
    pub limit: usize,
    #[source]
    pub source: axum::Error,
}

impl BodyCaptureError {
    /// True when the body hit the size bound, as opposed to a broken upload.
    pub fn is_too_large(&self) -> bool {
        let mut cause = self.source.source();
        while let Some(err) = cause {
            if err.is::<LengthLimitError>() {
                return true;
            }
            cause = err.source();
        }
        false
    }
}

/// Buffer the whole body, up to `limit` bytes.
pub async fn buffer_body(body: Body, limit: usize) -> Result<Bytes, BodyCaptureError> {
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|source| BodyCaptureError { limit, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn inbound_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn missing_id_is_generated() {
        let id = request_id(&HeaderMap::new());
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_ne!(id, request_id(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn buffers_within_limit() {
        let bytes = buffer_body(Body::from("hello"), 5).await.unwrap();
        assert_eq!(bytes, "hello");
    }

    #[tokio::test]
    async fn rejects_over_limit() {
        let err = buffer_body(Body::from("hello world"), 5).await.unwrap_err();
        assert_eq!(err.limit, 5);
        assert!(err.is_too_large());
    }

    #[tokio::test]
    async fn broken_upload_is_not_too_large() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"he")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
        ];
        let body = Body::from_stream(futures_util::stream::iter(chunks));

        let err = buffer_body(body, 1024).await.unwrap_err();
        assert!(!err.is_too_large());
    }
}
