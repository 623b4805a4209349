//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! requirements. Every problem is reported, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, RateLimitRule};
use crate::security::origin::normalize_origin;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("security.allowed_origins: '{0}' is not a valid origin")]
    InvalidOrigin(String),

    #[error("mail.{0}: required when mail is enabled")]
    MissingMailField(&'static str),

    #[error("webhook.secret: must not be empty when set")]
    EmptyWebhookSecret,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_connections" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "security.max_body_size" });
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.sweep_interval_secs" });
    }

    for origin in &config.security.allowed_origins {
        if normalize_origin(origin).is_none() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    check_rule(&mut errors, &config.contact.rate_limit, "contact.rate_limit");
    check_rule(&mut errors, &config.newsletter.rate_limit, "newsletter.rate_limit");
    check_rule(&mut errors, &config.webhook.rate_limit, "webhook.rate_limit");

    if config.contact.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "contact.max_body_bytes" });
    }
    if config.newsletter.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "newsletter.max_body_bytes" });
    }
    if config.webhook.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "webhook.max_body_bytes" });
    }
    if config.webhook.tolerance_secs == 0 {
        errors.push(ValidationError::Zero { field: "webhook.tolerance_secs" });
    }
    if matches!(config.webhook.secret.as_deref(), Some(s) if s.trim().is_empty()) {
        errors.push(ValidationError::EmptyWebhookSecret);
    }

    if config.mail.enabled {
        if config.mail.api_key.is_empty() {
            errors.push(ValidationError::MissingMailField("api_key"));
        }
        if config.mail.api_url.is_empty() {
            errors.push(ValidationError::MissingMailField("api_url"));
        }
        if config.mail.from.is_empty() {
            errors.push(ValidationError::MissingMailField("from"));
        }
        if config.mail.notify_to.is_empty() {
            errors.push(ValidationError::MissingMailField("notify_to"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rule(errors: &mut Vec<ValidationError>, rule: &RateLimitRule, field: &'static str) {
    if rule.max_requests == 0 || rule.window_ms == 0 {
        errors.push(ValidationError::Zero { field });
    }
}
