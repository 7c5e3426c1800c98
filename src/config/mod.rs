//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, overlay environment)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via AppState to all handlers
//! ```
//!
//! All fields have defaults so a deployment can run from environment
//! variables alone.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, AppConfig, ContactConfig, IdentityConfig, ObservabilityConfig,
    RateLimitConfig, ServerConfig, SmtpConfig, StorageBackend, StorageConfig,
};
