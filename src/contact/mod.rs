//! Contact form subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/contact
//!     → handlers.rs (decode, resolve client IP)
//!     → validator.rs screen (honeypot → timing)
//!     → security::rate_limit (per-IP sliding window)
//!     → validator.rs validate (fields → header injection)
//!     → mail (one outbound message)
//! ```

pub mod handlers;
pub mod types;
pub mod validator;

pub use types::{ContactResponse, ContactSubmission};
pub use validator::{ContactPolicy, ContactRejection, ContactValidator, Screening};
