//! Candidate list construction.
//!
//! # Responsibilities
//! - Represent a single backend origin and its place in the try sequence
//! - Build the immutable `[primary, backup1, backup2, ...]` list at startup
//!
//! # Design Decisions
//! - Built once from configuration, never mutated, shared read-only via Arc
//! - Primary is always order 0; backups keep their configured relative order
//! - A malformed origin is a startup error, never a per-request one

use std::fmt;
use std::ops::Deref;

use crate::config::validation::{parse_origin, ValidationError};
use crate::config::{ConfigError, UpstreamConfig};

/// Role of a candidate. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Backup,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Backup => "backup",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single backend origin eligible to receive a forwarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Normalized base URL without a trailing slash.
    base_url: String,
    role: Role,
    order: usize,
}

impl Candidate {
    fn new(origin: &str, role: Role, order: usize) -> Result<Self, String> {
        let url = parse_origin(origin)?;
        let base_url = url.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            role,
            order,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn is_primary(&self) -> bool {
        self.role == Role::Primary
    }

    /// Outbound URL for a request path (`/path?query`).
    pub fn target(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.base_url, path_and_query)
        } else {
            format!("{}/{}", self.base_url, path_and_query)
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

/// Ordered, immutable sequence of candidates.
#[derive(Debug, Clone)]
pub struct CandidateList {
    candidates: Vec<Candidate>,
}

impl CandidateList {
    /// Build the try sequence from configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ConfigError> {
        if config.primary.trim().is_empty() {
            return Err(ConfigError::Validation(vec![ValidationError::MissingPrimary]));
        }

        let mut candidates = Vec::with_capacity(1 + config.backups.len());
        let mut errors = Vec::new();

        let origins = std::iter::once((Role::Primary, "upstreams.primary".to_string(), &config.primary)).chain(
            config
                .backups
                .iter()
                .enumerate()
                .map(|(i, b)| (Role::Backup, format!("upstreams.backups[{}]", i), b)),
        );

        for (order, (role, field, origin)) in origins.enumerate() {
            match Candidate::new(origin, role, order) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => errors.push(ValidationError::InvalidOrigin {
                    field,
                    value: origin.clone(),
                    reason,
                }),
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        tracing::debug!(
            primary = %candidates[0],
            backups = candidates.len() - 1,
            "Candidate list built"
        );

        Ok(Self { candidates })
    }

    pub fn primary(&self) -> &Candidate {
        &self.candidates[0]
    }
}

impl Deref for CandidateList {
    type Target = [Candidate];

    fn deref(&self) -> &Self::Target {
        &self.candidates
    }
}
