//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ValidationError::new("storage.database_path", "must not be empty"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    let tracking = &config.tracking;
    if tracking.timeout_ms == 0 {
        errors.push(ValidationError::new("tracking.timeout_ms", "must be greater than 0"));
    }
    if !matches!(tracking.scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::new(
            "tracking.scheme",
            format!("'{}' must be http or https", tracking.scheme),
        ));
    }
    if tracking.host_override.is_none() && tracking.subdomain.trim().is_empty() {
        errors.push(ValidationError::new(
            "tracking.subdomain",
            "must not be empty unless host_override is set",
        ));
    }
    if let Some(host) = &tracking.host_override {
        if host.trim().is_empty() {
            errors.push(ValidationError::new("tracking.host_override", "must not be empty"));
        }
    }
    if tracking.click_id_field.trim().is_empty() {
        errors.push(ValidationError::new("tracking.click_id_field", "must not be empty"));
    }

    if config.spy.domains.iter().any(|d| d.trim().is_empty()) {
        errors.push(ValidationError::new("spy.domains", "entries must not be blank"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
