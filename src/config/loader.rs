//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file (if given), overlay the environment, then validate.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => AppConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay the deployment environment variables on top of `config`.
///
/// `lookup` abstracts `std::env::var` so the overlay can be tested without
/// touching process state.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(addr) = get("BIND_ADDRESS") {
        config.server.bind_address = addr;
    } else if let Some(port) = get("PORT") {
        config.server.bind_address = format!("0.0.0.0:{port}");
    }

    if let Some(origins) = get("CORS_ORIGINS") {
        let origins: Vec<String> = origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if !origins.is_empty() {
            config.server.cors_origins = origins;
        }
    }

    if let Some(url) = get("DATABASE_URL") {
        config.storage.database_url = url;
    }
    if let Some(key) = get("FIREBASE_API_KEY") {
        config.identity.api_key = key;
    }
    if let Some(emails) = get("ADMIN_EMAILS") {
        config.admin.emails = emails;
    }

    if let Some(to) = get("CONTACT_TO") {
        config.contact.to = to;
    }
    if let Some(from) = get("CONTACT_FROM") {
        config.contact.from = from;
    }
    if let Some(prefix) = get("CONTACT_SUBJECT_PREFIX") {
        config.contact.subject_prefix = prefix;
    }

    if let Some(host) = get("SMTP_HOST") {
        config.smtp.host = host;
    }
    if let Some(port) = get("SMTP_PORT") {
        config.smtp.port = match port.parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => {
                return Err(ConfigError::Env {
                    key: "SMTP_PORT",
                    value: port,
                })
            }
        };
    }
    if let Some(user) = get("SMTP_USER") {
        config.smtp.username = user;
    }
    // Passwords are taken verbatim.
    if let Some(pass) = lookup("SMTP_PASS").filter(|p| !p.is_empty()) {
        config.smtp.password = pass;
    }
    if let Some(flag) = get("SMTP_IMPLICIT_TLS") {
        config.smtp.implicit_tls = Some(parse_bool(&flag));
    }
    if let Some(flag) = get("SMTP_TLS_INSECURE_SKIP_VERIFY") {
        config.smtp.tls_insecure_skip_verify = parse_bool(&flag);
    }

    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    Ok(())
}

pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
