//! Configuration validation.
//!
//! Serde handles the syntax; this is the semantic pass. Every problem is
//! reported, not just the first one.

use std::fmt;

use crate::config::schema::{AppConfig, StorageBackend};

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.trim().is_empty() {
        errors.push(ValidationError::new("server.bind_address", "must not be empty"));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }

    if config.storage.backend == StorageBackend::Postgres
        && config.storage.database_url.trim().is_empty()
    {
        errors.push(ValidationError::new(
            "storage.database_url",
            "required for the postgres backend (set DATABASE_URL)",
        ));
    }

    let contact = &config.contact;
    if contact.rate_limit.limit == 0 {
        errors.push(ValidationError::new("contact.rate_limit.limit", "must be > 0"));
    }
    if contact.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new("contact.rate_limit.window_secs", "must be > 0"));
    }
    if contact.min_age() > contact.max_age() {
        errors.push(ValidationError::new(
            "contact.min_age_ms",
            "must not exceed contact.max_age_secs",
        ));
    }

    if config.smtp.is_configured() {
        if config.smtp.port == 0 {
            errors.push(ValidationError::new("smtp.port", "must be in 1..=65535"));
        }
        if config.smtp.timeout_secs == 0 {
            errors.push(ValidationError::new("smtp.timeout_secs", "must be > 0"));
        }
        if config.smtp.username.is_empty() != config.smtp.password.is_empty() {
            errors.push(ValidationError::new(
                "smtp.username",
                "username and password must both be set",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
