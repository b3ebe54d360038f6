//! Client for the reply service.
//!
//! One chat message in, one reply text out. Any failure collapses to the
//! configured fallback text so the chat identity always gets an answer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RelayConfig;

/// Sent when the reply service answers without a `reply` field.
pub const NO_REPLY: &str = "⚠️ No reply generated";

/// Request body understood by the reply service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: String,
    pub message: String,
    pub clone: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct BrainReply {
    reply: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("reply service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP client for the reply service.
#[derive(Debug, Clone)]
pub struct BrainClient {
    client: reqwest::Client,
    url: String,
    fallback_reply: String,
}

impl BrainClient {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            url: config.brain_url.clone(),
            fallback_reply: config.fallback_reply.clone(),
        })
    }

    /// Ask for a reply, surfacing errors. Non-2xx answers are errors.
    pub async fn request_reply(&self, message: &ChatMessage) -> Result<String, RelayError> {
        let reply: BrainReply = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(reply
            .reply
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| NO_REPLY.to_string()))
    }

    /// Ask for a reply; on any error return the fallback text.
    pub async fn ask(&self, message: &ChatMessage) -> String {
        match self.request_reply(message).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(user = %message.user, error = %e, "Reply service error");
                self.fallback_reply.clone()
            }
        }
    }
}
