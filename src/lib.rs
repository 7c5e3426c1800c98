//! Content site backend library.
//!
//! REST API for articles, courses, categories, projects and certificates,
//! a contact form guarded against abuse, and a Firebase-backed admin gate.

pub mod admin;
pub mod config;
pub mod contact;
pub mod error;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod mail;
pub mod observability;
pub mod security;
pub mod storage;

pub use config::AppConfig;
pub use error::ApiError;
pub use http::{AppState, HttpServer};
