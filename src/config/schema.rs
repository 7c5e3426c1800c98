//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the backend.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the site backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener and middleware settings.
    pub server: ServerConfig,

    /// Content storage settings.
    pub storage: StorageConfig,

    /// Identity provider (token verification) settings.
    pub identity: IdentityConfig,

    /// Administrator allow-list.
    pub admin: AdminConfig,

    /// Contact form policy and routing.
    pub contact: ContactConfig,

    /// Outbound SMTP relay.
    pub smtp: SmtpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,

    /// Service name reported by the health check.
    pub service_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
            cors_origins: vec![
                "http://localhost:4321".to_string(),
                "http://localhost:3000".to_string(),
            ],
            service_name: "site-backend".to_string(),
        }
    }
}

/// Which store implementation backs the content routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// PostgreSQL connection string.
    pub database_url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Pool acquire timeout in seconds.
    pub acquire_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            database_url: String::new(),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

/// Identity provider configuration (Firebase Identity Toolkit).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Web API key of the Firebase project.
    pub api_key: String,

    /// Base URL of the Identity Toolkit REST API.
    pub endpoint: String,

    /// Verification request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://identitytoolkit.googleapis.com".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Comma-separated administrator emails. Empty denies every admin request.
    pub emails: String,
}

/// Contact form configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Recipient of contact messages.
    pub to: String,

    /// Envelope and header sender.
    pub from: String,

    /// Prepended to every outbound subject.
    pub subject_prefix: String,

    /// Trust the first `X-Forwarded-For` hop as the client address.
    pub trust_forwarded_for: bool,

    /// Submissions younger than this (milliseconds) are treated as automated.
    pub min_age_ms: u64,

    /// Submissions older than this (seconds) are treated as stale.
    pub max_age_secs: u64,

    pub rate_limit: RateLimitConfig,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            to: String::new(),
            from: String::new(),
            subject_prefix: String::new(),
            trust_forwarded_for: false,
            min_age_ms: 2_000,
            max_age_secs: 2 * 60 * 60,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ContactConfig {
    pub fn min_age(&self) -> Duration {
        Duration::from_millis(self.min_age_ms)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

/// Sliding-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Accepted submissions per identifier within the window.
    pub limit: usize,

    /// Trailing window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            window_secs: 10 * 60,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// SMTP relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay host. Empty disables outbound mail.
    pub host: String,

    pub port: u16,

    pub username: String,

    pub password: String,

    /// Force implicit TLS on or off. Unset means "implicit on port 465".
    pub implicit_tls: Option<bool>,

    /// Accept invalid relay certificates.
    pub tls_insecure_skip_verify: bool,

    /// Connect and command timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            implicit_tls: None,
            tls_insecure_skip_verify: false,
            timeout_secs: 10,
        }
    }
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
    }

    pub fn uses_implicit_tls(&self) -> bool {
        self.implicit_tls.unwrap_or(self.port == 465)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
