//! Configuration validation.
//!
//! Serde handles syntax; this module checks meaning. Validation is a pure
//! function that reports every problem it finds, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("upstreams.primary must not be empty")]
    MissingPrimary,
    #[error("{field}: invalid origin '{value}': {reason}")]
    InvalidOrigin {
        field: String,
        value: String,
        reason: String,
    },
    #[error("{field}: origin '{value}' is listed more than once")]
    DuplicateOrigin { field: String, value: String },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let upstreams = &config.upstreams;

    if upstreams.primary.trim().is_empty() {
        errors.push(ValidationError::MissingPrimary);
    } else {
        check_origin("upstreams.primary", &upstreams.primary, &mut errors);
    }

    for (i, backup) in upstreams.backups.iter().enumerate() {
        check_origin(&format!("upstreams.backups[{}]", i), backup, &mut errors);
    }

    let mut seen = HashSet::new();
    let all = std::iter::once(("upstreams.primary".to_string(), &upstreams.primary)).chain(
        upstreams
            .backups
            .iter()
            .enumerate()
            .map(|(i, b)| (format!("upstreams.backups[{}]", i), b)),
    );
    for (field, origin) in all {
        let key = origin.trim().trim_end_matches('/').to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        if !seen.insert(key) {
            errors.push(ValidationError::DuplicateOrigin {
                field,
                value: origin.clone(),
            });
        }
    }

    if upstreams.attempt_timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "upstreams.attempt_timeout_ms",
        });
    }
    if upstreams.max_body_bytes == 0 {
        errors.push(ValidationError::Zero {
            field: "upstreams.max_body_bytes",
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if config.relay.timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "relay.timeout_ms",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that `value` is an absolute http(s) origin, optionally with a path prefix.
pub(crate) fn parse_origin(value: &str) -> Result<Url, String> {
    let url = Url::parse(value.trim()).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(url)
}

fn check_origin(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    if let Err(reason) = parse_origin(value) {
        errors.push(ValidationError::InvalidOrigin {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        });
    }
}
