//! Structured logging.
//!
//! Uses `tracing` with an `EnvFilter`; `RUST_LOG` wins over the configured
//! level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(log_level: &str) -> String {
    format!("failover_gateway={level},tower_http={level}", level = log_level)
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(log_level).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_targets_crate_and_http_layer() {
        assert_eq!(default_filter("debug"), "failover_gateway=debug,tower_http=debug");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init("info");
        init("warn");
    }
}
