//! Messaging relay subsystem.
//!
//! # Data Flow
//! ```text
//! Chat network event
//!     → session.rs (supervised connection, fixed-delay reconnect)
//!     → Relay::on_event (drop own messages and events without a message)
//!     → brain.rs (POST {user, message, clone} → {reply})
//!     → Outgoing reply to the same chat identity
//! ```
//!
//! # Design Decisions
//! - Independent of the failover core; the gateway never sees chat semantics
//! - The tenant descriptor is opaque JSON taken from configuration
//! - Errors never reach the chat identity; it gets the fallback text instead

pub mod brain;
pub mod session;

pub use brain::{BrainClient, ChatMessage, RelayError, NO_REPLY};
pub use session::{ChatConnector, CloseReason, SessionState, SessionSupervisor, SupervisorExit};

use crate::config::RelayConfig;

/// A message observed on the chat network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// Chat identity of the sender.
    pub sender: String,
    /// `None` when the event carries no message at all. A message without
    /// text (media, stickers) is `Some("")` and still gets an answer.
    pub text: Option<String>,
    /// Sent by this account.
    pub from_me: bool,
}

/// A reply to deliver on the chat network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub to: String,
    pub text: String,
}

/// Turns chat events into replies.
#[derive(Debug, Clone)]
pub struct Relay {
    brain: BrainClient,
    tenant: serde_json::Value,
}

impl Relay {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        Ok(Self {
            brain: BrainClient::new(config)?,
            tenant: config.tenant.clone(),
        })
    }

    /// Reply to an inbound event, or `None` for events that need no answer.
    pub async fn on_event(&self, event: ChatEvent) -> Option<Outgoing> {
        if event.from_me {
            return None;
        }
        let text = event.text?;

        tracing::info!(sender = %event.sender, "Incoming chat message");

        let message = ChatMessage {
            user: event.sender,
            message: text,
            clone: self.tenant.clone(),
        };
        let reply = self.brain.ask(&message).await;

        Some(Outgoing {
            to: message.user,
            text: reply,
        })
    }
}
