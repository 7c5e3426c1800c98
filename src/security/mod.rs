//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Contact request:
//!     → headers.rs (resolve client identifier)
//!     → rate_limit.rs (sliding-window admission per identifier)
//!     → contact validation
//!
//! Outbound mail:
//!     → headers.rs (neutralize CR/LF before anything reaches a header)
//! ```
//!
//! Fail closed: reject on any security check failure.

pub mod clock;
pub mod headers;
pub mod rate_limit;

pub use clock::{Clock, SystemClock};
pub use rate_limit::{RateLimiter, SlidingWindowLimiter};
