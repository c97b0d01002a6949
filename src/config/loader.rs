//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable {var}='{value}' is not valid")]
    Env { var: &'static str, value: String },

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

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the env-style overrides on top of `config`.
///
/// `lookup` resolves a variable name to its value, if set.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = parse_var::<u16, _>(&lookup, "PORT")? {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{host}:{port}");
    }

    if let Some(url) = lookup("AUTH_SERVICE_URL") {
        config.upstreams.identity.base_url = url;
    }
    if let Some(url) = lookup("POST_SERVICE_URL") {
        config.upstreams.content.base_url = url;
    }
    if let Some(url) = lookup("COMMENT_SERVICE_URL") {
        config.upstreams.commentary.base_url = url;
    }
    if let Some(secret) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(origin) = lookup("CORS_ORIGIN") {
        config.cors.origin = origin;
    }
    if let Some(attempts) = parse_var(&lookup, "RETRY_ATTEMPTS")? {
        config.retries.max_attempts = attempts;
    }
    if let Some(delay) = parse_var(&lookup, "RETRY_DELAY_MS")? {
        config.retries.base_delay_ms = delay;
    }
    if let Some(timeout) = parse_var::<u64, _>(&lookup, "PROXY_TIMEOUT_MS")? {
        for upstream in [
            &mut config.upstreams.identity,
            &mut config.upstreams.content,
            &mut config.upstreams.commentary,
        ] {
            upstream.connect_timeout_ms = timeout;
            upstream.response_timeout_ms = timeout;
        }
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    Ok(())
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
        None => Ok(None),
    }
}
