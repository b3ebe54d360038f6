//! Ordered-failover HTTP gateway.
//!
//! Every inbound request is replayed, in order, to a primary origin and then
//! to each backup until one answers below 500. If none does, the caller gets
//! a fixed `503 Service unavailable`.

pub mod config;
pub mod error;
pub mod failover;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod resilience;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use failover::{FailoverDecision, FailoverDispatcher};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
