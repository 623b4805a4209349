//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `webhook.secret`.
pub const ENV_WEBHOOK_SECRET: &str = "CONTACT_GATEWAY_WEBHOOK_SECRET";
/// Environment variable overriding `admin.api_key`.
pub const ENV_ADMIN_API_KEY: &str = "CONTACT_GATEWAY_ADMIN_API_KEY";
/// Environment variable overriding `mail.api_key`.
pub const ENV_MAIL_API_KEY: &str = "CONTACT_GATEWAY_MAIL_API_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse, apply environment overrides and validate.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let mut config: GatewayConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Secrets usually come from the environment rather than the file.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup(ENV_WEBHOOK_SECRET).filter(|s| !s.is_empty()) {
        config.webhook.secret = Some(secret);
    }
    if let Some(key) = lookup(ENV_ADMIN_API_KEY).filter(|s| !s.is_empty()) {
        config.admin.api_key = key;
    }
    if let Some(key) = lookup(ENV_MAIL_API_KEY).filter(|s| !s.is_empty()) {
        config.mail.api_key = key;
    }
}
