//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the failover gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Candidate origins and the per-attempt policy.
    pub upstreams: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Messaging relay settings.
    pub relay: RelayConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// How candidates are contacted for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// One attempt at a time, in configured order.
    #[default]
    Sequential,
    /// All attempts launched together; the lowest-order success wins.
    Race,
}

/// Upstream candidates and failover policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Primary origin (e.g., "https://api.example.com"). Required.
    pub primary: String,

    /// Backup origins, tried in this order after the primary.
    pub backups: Vec<String>,

    /// Wall-clock bound on each attempt, in milliseconds.
    pub attempt_timeout_ms: u64,

    /// Dispatch strategy.
    pub mode: DispatchMode,

    /// Largest request body buffered for replay across candidates.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            primary: String::new(),
            backups: Vec::new(),
            attempt_timeout_ms: 3000,
            mode: DispatchMode::Sequential,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Settings for the chat relay that feeds the reply service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Endpoint that turns `{user, message, clone}` into `{reply}`.
    pub brain_url: String,

    /// Timeout for a single reply request in milliseconds.
    pub timeout_ms: u64,

    /// Text sent back to the chat identity when the reply service fails.
    pub fallback_reply: String,

    /// Fixed delay before reconnecting a dropped chat session.
    pub reconnect_delay_ms: u64,

    /// Tenant descriptor sent with every message, passed through untouched.
    pub tenant: serde_json::Value,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            brain_url: "http://localhost:8000/handle".to_string(),
            timeout_ms: 10_000,
            fallback_reply: "⚠️ System temporarily unavailable.".to_string(),
            reconnect_delay_ms: 5000,
            tenant: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstreams]
            primary = "https://primary.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstreams.primary, "https://primary.example.com");
        assert!(config.upstreams.backups.is_empty());
        assert_eq!(config.upstreams.attempt_timeout_ms, 3000);
        assert_eq!(config.upstreams.mode, DispatchMode::Sequential);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn race_mode_parses() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstreams]
            primary = "http://a"
            backups = ["http://b", "http://c"]
            mode = "race"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstreams.mode, DispatchMode::Race);
        assert_eq!(config.upstreams.backups, vec!["http://b", "http://c"]);
    }

    #[test]
    fn relay_tenant_is_opaque_table() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [relay.tenant]
            id = "kenya_real_estate"
            region = "Kenya"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.relay.tenant,
            serde_json::json!({"id": "kenya_real_estate", "region": "Kenya"})
        );
        assert_eq!(config.relay.brain_url, "http://localhost:8000/handle");
    }
}
