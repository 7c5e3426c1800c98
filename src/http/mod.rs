//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, body and path extraction)
//!     → admin gate (content writes only)
//!     → content.rs | contact | admin::handlers
//!     → response.rs (status + JSON)
//! ```

pub mod content;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ApiJson, ApiPath, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
